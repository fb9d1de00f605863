//! Success/failure counters per job name.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::ExecutionStatistics;

/// Point-in-time view of one job's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCountSnapshot {
    pub job_name: String,
    pub success_count: u64,
    pub failure_count: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct JobCounters {
    success: AtomicU64,
    failure: AtomicU64,
    updated_at: RwLock<DateTime<Utc>>,
}

impl JobCounters {
    fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            updated_at: RwLock::new(Utc::now()),
        }
    }

    fn touch(&self) {
        *self.updated_at.write() = Utc::now();
    }
}

/// Process-wide success/failure counts keyed by job name
///
/// Cheap to clone; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct ProcessCountStatistics {
    jobs: Arc<DashMap<String, Arc<JobCounters>>>,
}

impl ProcessCountStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, job_name: &str) -> Arc<JobCounters> {
        if let Some(existing) = self.jobs.get(job_name) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.jobs
                .entry(job_name.to_string())
                .or_insert_with(|| Arc::new(JobCounters::new()))
                .value(),
        )
    }

    /// Zero the counters of a job
    pub fn reset(&self, job_name: &str) {
        let counters = self.counters(job_name);
        counters.success.store(0, Ordering::Release);
        counters.failure.store(0, Ordering::Release);
        counters.touch();
    }

    /// Add the outcome of a dispatch to a job's counters
    pub fn record(&self, job_name: &str, stats: &ExecutionStatistics) {
        let counters = self.counters(job_name);
        counters
            .success
            .fetch_add(stats.success_count, Ordering::AcqRel);
        counters
            .failure
            .fetch_add(stats.failure_count, Ordering::AcqRel);
        counters.touch();
    }

    pub fn success_count(&self, job_name: &str) -> u64 {
        self.jobs
            .get(job_name)
            .map(|c| c.success.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn failure_count(&self, job_name: &str) -> u64 {
        self.jobs
            .get(job_name)
            .map(|c| c.failure.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn statistics(&self, job_name: &str) -> ExecutionStatistics {
        ExecutionStatistics::new(self.success_count(job_name), self.failure_count(job_name))
    }

    pub fn snapshot(&self, job_name: &str) -> Option<ProcessCountSnapshot> {
        self.jobs.get(job_name).map(|counters| ProcessCountSnapshot {
            job_name: job_name.to_string(),
            success_count: counters.success.load(Ordering::Acquire),
            failure_count: counters.failure.load(Ordering::Acquire),
            updated_at: *counters.updated_at.read(),
        })
    }

    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
