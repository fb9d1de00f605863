use async_trait::async_trait;
use parking_lot::Mutex;
use shardflow_core::{JobFacade, Result, ShardItem, ShardflowError, ShardingContext};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Every call the executor made on the facade, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacadeCall {
    IsMisfire(Vec<ShardItem>),
    ClearMisfire(Vec<ShardItem>),
    ConcurrencyLevel,
    UpdateOffset(ShardItem, String),
    BeforeJobExecuted(String),
    AfterJobExecuted(String),
}

/// Facade double that records calls and serves scripted answers
#[derive(Debug)]
pub struct RecordingFacade {
    calls: Mutex<Vec<FacadeCall>>,
    misfire: AtomicBool,
    /// Served one per read; the last one repeats
    concurrency_levels: Mutex<VecDeque<usize>>,
    fail_misfire_query: AtomicBool,
    fail_clear: AtomicBool,
    fail_eligibility: AtomicBool,
    /// Number of eligibility checks answered with true before answering false
    eligible_checks: Mutex<Option<usize>>,
}

impl RecordingFacade {
    pub fn new(concurrency_level: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            misfire: AtomicBool::new(false),
            concurrency_levels: Mutex::new(VecDeque::from([concurrency_level])),
            fail_misfire_query: AtomicBool::new(false),
            fail_clear: AtomicBool::new(false),
            fail_eligibility: AtomicBool::new(false),
            eligible_checks: Mutex::new(None),
        }
    }

    pub fn with_concurrency_levels(levels: impl IntoIterator<Item = usize>) -> Self {
        let facade = Self::new(1);
        *facade.concurrency_levels.lock() = levels.into_iter().collect();
        facade
    }

    pub fn misfired(self) -> Self {
        self.misfire.store(true, Ordering::Release);
        self
    }

    pub fn failing_misfire_query(self) -> Self {
        self.fail_misfire_query.store(true, Ordering::Release);
        self
    }

    pub fn failing_eligibility(self) -> Self {
        self.fail_eligibility.store(true, Ordering::Release);
        self
    }

    pub fn failing_clear(self) -> Self {
        self.fail_clear.store(true, Ordering::Release);
        self
    }

    pub fn eligible_for(self, checks: usize) -> Self {
        *self.eligible_checks.lock() = Some(checks);
        self
    }

    pub fn calls(&self) -> Vec<FacadeCall> {
        self.calls.lock().clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&FacadeCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_misfire_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, FacadeCall::ClearMisfire(_)))
    }

    pub fn is_misfire_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, FacadeCall::IsMisfire(_)))
    }

    pub fn concurrency_reads(&self) -> usize {
        self.count_calls(|call| matches!(call, FacadeCall::ConcurrencyLevel))
    }

    pub fn offset_updates(&self) -> Vec<(ShardItem, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                FacadeCall::UpdateOffset(item, offset) => Some((*item, offset.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_call(&self) -> Option<FacadeCall> {
        self.calls.lock().last().cloned()
    }

    fn record(&self, call: FacadeCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl JobFacade for RecordingFacade {
    async fn is_misfire(&self, sharding_items: &[ShardItem]) -> Result<bool> {
        self.record(FacadeCall::IsMisfire(sharding_items.to_vec()));
        if self.fail_misfire_query.load(Ordering::Acquire) {
            return Err(ShardflowError::Facade("registry unavailable".to_string()));
        }
        Ok(self.misfire.load(Ordering::Acquire))
    }

    async fn clear_misfire(&self, sharding_items: &[ShardItem]) -> Result<()> {
        self.record(FacadeCall::ClearMisfire(sharding_items.to_vec()));
        if self.fail_clear.load(Ordering::Acquire) {
            return Err(ShardflowError::Facade("registry unavailable".to_string()));
        }
        self.misfire.store(false, Ordering::Release);
        Ok(())
    }

    async fn concurrency_level(&self) -> Result<usize> {
        self.record(FacadeCall::ConcurrencyLevel);
        let mut levels = self.concurrency_levels.lock();
        let level = if levels.len() > 1 {
            levels.pop_front()
        } else {
            levels.front().copied()
        };
        Ok(level.unwrap_or(1))
    }

    async fn update_offset(&self, item: ShardItem, offset: &str) -> Result<()> {
        self.record(FacadeCall::UpdateOffset(item, offset.to_string()));
        Ok(())
    }

    async fn before_job_executed(&self, context: &ShardingContext) -> Result<()> {
        self.record(FacadeCall::BeforeJobExecuted(context.job_name().to_string()));
        Ok(())
    }

    async fn after_job_executed(&self, context: &ShardingContext) -> Result<()> {
        self.record(FacadeCall::AfterJobExecuted(context.job_name().to_string()));
        Ok(())
    }

    async fn is_eligible_for_job_running(&self) -> Result<bool> {
        if self.fail_eligibility.load(Ordering::Acquire) {
            return Err(ShardflowError::Facade("job registry unreachable".to_string()));
        }
        let mut remaining = self.eligible_checks.lock();
        Ok(match remaining.as_mut() {
            None => true,
            Some(0) => false,
            Some(checks) => {
                *checks -= 1;
                true
            }
        })
    }
}

/// Counter that tracks the highest value it has reached
#[derive(Debug, Default)]
pub struct HighWaterMark {
    current: AtomicUsize,
    highest: AtomicUsize,
}

impl HighWaterMark {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.highest.fetch_max(now, Ordering::AcqRel);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn highest(&self) -> usize {
        self.highest.load(Ordering::Acquire)
    }
}
