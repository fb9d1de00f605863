//! Per-invocation processing statistics.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of processing one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
    Success,
    Failure,
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Success)
    }
}

impl From<bool> for ProcessOutcome {
    fn from(success: bool) -> Self {
        if success {
            ProcessOutcome::Success
        } else {
            ProcessOutcome::Failure
        }
    }
}

/// Final success/failure counts of a dispatch or a whole invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    pub success_count: u64,
    pub failure_count: u64,
}

impl ExecutionStatistics {
    pub fn new(success_count: u64, failure_count: u64) -> Self {
        Self {
            success_count,
            failure_count,
        }
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Add for ExecutionStatistics {
    type Output = ExecutionStatistics;

    fn add(self, rhs: Self) -> Self::Output {
        ExecutionStatistics {
            success_count: self.success_count + rhs.success_count,
            failure_count: self.failure_count + rhs.failure_count,
        }
    }
}

impl AddAssign for ExecutionStatistics {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Lock-free counters shared by the workers of one dispatch
#[derive(Debug, Default)]
pub struct ExecutionCounters {
    success: AtomicU64,
    failure: AtomicU64,
}

impl ExecutionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: ProcessOutcome) {
        match outcome {
            ProcessOutcome::Success => self.success.fetch_add(1, Ordering::AcqRel),
            ProcessOutcome::Failure => self.failure.fetch_add(1, Ordering::AcqRel),
        };
    }

    pub fn snapshot(&self) -> ExecutionStatistics {
        ExecutionStatistics {
            success_count: self.success.load(Ordering::Acquire),
            failure_count: self.failure.load(Ordering::Acquire),
        }
    }
}
