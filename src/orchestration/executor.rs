//! # Dataflow Executor
//!
//! Turns one scheduling trigger into fetch/process cycles for the shard items in a
//! [`ShardingContext`].
//!
//! ## Invocation lifecycle
//!
//! 1. Reset the job's counters in the statistics sink.
//! 2. Ask the facade whether the trigger misfired. Under [`MisfirePolicy::Skip`] a
//!    misfired trigger does no work.
//! 3. Run cycles: fetch, and when there is data read the concurrency level and
//!    dispatch. Throughput mode runs one cycle; streaming mode repeats until a fetch
//!    comes back empty, the stop signal is raised or the facade withdraws eligibility.
//! 4. Clear the misfire flag. This happens on every path once the misfire query
//!    has succeeded, including empty fetches and fetch errors.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::client::DataflowJob;
use crate::config::ShardflowConfig;
use crate::constants::{DataflowType, MisfirePolicy};
use crate::error::{Result, ShardflowError};
use crate::facade::JobFacade;
use crate::metrics::ProcessCountStatistics;
use crate::models::{ExecutionStatistics, ShardItem, ShardingContext};

use super::dispatcher::{panic_message, ConcurrentDispatcher, Partition};

/// Cooperative stop flag for streaming loops
///
/// Checked once per streaming cycle after its dispatch has been joined; a dispatch in
/// flight is never interrupted. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Allow streaming loops to run again after a stop
    pub fn resume(&self) {
        self.stopped.store(false, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Executes a [`DataflowJob`] for the shard items of each trigger
pub struct DataflowExecutor<J: DataflowJob> {
    job: Arc<J>,
    facade: Arc<dyn JobFacade>,
    config: ShardflowConfig,
    dispatcher: ConcurrentDispatcher<J>,
    statistics: ProcessCountStatistics,
    stop_signal: StopSignal,
}

impl<J: DataflowJob> DataflowExecutor<J> {
    pub fn new(job: Arc<J>, facade: Arc<dyn JobFacade>, config: ShardflowConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            dispatcher: ConcurrentDispatcher::new(Arc::clone(&job)),
            job,
            facade,
            config,
            statistics: ProcessCountStatistics::new(),
            stop_signal: StopSignal::new(),
        })
    }

    /// Report into a caller-owned statistics sink instead of a private one
    pub fn with_statistics(mut self, statistics: ProcessCountStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Share an externally controlled stop signal
    pub fn with_stop_signal(mut self, stop_signal: StopSignal) -> Self {
        self.stop_signal = stop_signal;
        self
    }

    pub fn config(&self) -> &ShardflowConfig {
        &self.config
    }

    pub fn statistics(&self) -> &ProcessCountStatistics {
        &self.statistics
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop_signal
    }

    /// Run one invocation for the shard items in `context`
    ///
    /// Returns the statistics accumulated over all cycles of this invocation; the
    /// same counts are merged into the statistics sink as each dispatch completes.
    #[instrument(
        skip(self, context),
        fields(
            job_name = %context.job_name(),
            execution_id = %Uuid::new_v4(),
            execution_mode = %self.config.execution_mode,
            dataflow_type = %self.config.dataflow_type,
        )
    )]
    pub async fn execute(&self, context: ShardingContext) -> Result<ExecutionStatistics> {
        let context = Arc::new(context);
        let sharding_items = context.sharding_items().to_vec();

        self.statistics.reset(context.job_name());

        let misfired = self.facade.is_misfire(&sharding_items).await?;

        let outcome = if misfired && self.config.misfire_policy == MisfirePolicy::Skip {
            info!(
                sharding_items = ?sharding_items,
                "Trigger misfired while a previous execution was running, skipping"
            );
            Ok(ExecutionStatistics::default())
        } else {
            if misfired {
                debug!(sharding_items = ?sharding_items, "Executing misfired trigger");
            }
            self.run_cycles(&context).await
        };

        let cleared = self.facade.clear_misfire(&sharding_items).await;

        match (outcome, cleared) {
            (Ok(stats), Ok(())) => {
                info!(
                    success_count = stats.success_count,
                    failure_count = stats.failure_count,
                    "Execution completed"
                );
                Ok(stats)
            }
            (Ok(_), Err(clear_error)) => {
                error!(error = %clear_error, "Failed to clear misfire flag");
                Err(clear_error)
            }
            (Err(e), Ok(())) => {
                error!(error = %e, "Execution failed");
                Err(e)
            }
            (Err(e), Err(clear_error)) => {
                error!(
                    error = %e,
                    clear_error = %clear_error,
                    "Execution failed and misfire flag could not be cleared"
                );
                Err(e)
            }
        }
    }

    /// Forward a shard item's resume position to the facade unchanged
    pub async fn update_offset(&self, item: ShardItem, offset: &str) -> Result<()> {
        self.facade.update_offset(item, offset).await
    }

    async fn run_cycles(&self, context: &Arc<ShardingContext>) -> Result<ExecutionStatistics> {
        self.facade.before_job_executed(context).await?;

        let mut total = ExecutionStatistics::default();
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;
            let Some(stats) = self.run_cycle(context).await? else {
                debug!(cycle = cycle, "Fetch returned no data");
                break;
            };
            total += stats;

            if !self.config.execution_mode.is_streaming() {
                break;
            }
            if self.stop_signal.is_stopped() {
                info!(cycle = cycle, "Stop requested, leaving streaming loop");
                break;
            }
            if !self.facade.is_eligible_for_job_running().await? {
                info!(cycle = cycle, "Job no longer eligible to run, leaving streaming loop");
                break;
            }
        }

        self.facade.after_job_executed(context).await?;
        Ok(total)
    }

    /// One fetch/dispatch cycle; `None` when the fetch produced no work
    async fn run_cycle(&self, context: &Arc<ShardingContext>) -> Result<Option<ExecutionStatistics>> {
        let stats = match self.config.dataflow_type {
            DataflowType::Batch => {
                let batch = self.fetch(context).await?;
                if batch.is_empty() {
                    return Ok(None);
                }
                let worker_count = self.facade.concurrency_level().await?;
                debug!(
                    batch_size = batch.len(),
                    worker_count = worker_count,
                    "Fetched batch"
                );
                self.dispatcher
                    .dispatch(Arc::clone(context), batch, worker_count)
                    .await?
            }
            DataflowType::Sequence => {
                let partitions = self.fetch_per_item(context).await?;
                if partitions.is_empty() {
                    return Ok(None);
                }
                debug!(
                    shard_batches = partitions.len(),
                    "Fetched per-item batches"
                );
                self.dispatcher.dispatch_partitions(partitions).await?
            }
        };

        self.statistics.record(context.job_name(), &stats);
        Ok(Some(stats))
    }

    async fn fetch(&self, context: &ShardingContext) -> Result<Vec<J::Item>> {
        fetch_isolated(self.job.as_ref(), context).await
    }

    /// Fetch every shard item concurrently under its own single-item context
    async fn fetch_per_item(&self, context: &ShardingContext) -> Result<Vec<Partition<J::Item>>> {
        let mut handles = Vec::with_capacity(context.sharding_items().len());
        for item in context.sharding_items() {
            let Some(item_context) = context.for_item(*item) else {
                continue;
            };
            let job = Arc::clone(&self.job);
            handles.push(tokio::spawn(async move {
                let fetched = fetch_isolated(job.as_ref(), &item_context).await;
                (item_context, fetched)
            }));
        }

        let mut partitions = Vec::with_capacity(handles.len());
        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok((item_context, Ok(items))) => {
                    if !items.is_empty() {
                        partitions.push(Partition::new(Arc::new(item_context), items));
                    }
                }
                Ok((item_context, Err(e))) => {
                    warn!(
                        sharding_items = ?item_context.sharding_items(),
                        error = %e,
                        "Fetch failed for shard item"
                    );
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(ShardflowError::Fetch(format!(
                        "fetch task failed to join: {e}"
                    )));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(partitions),
        }
    }
}

/// Run the fetch hook, turning errors and panics into [`ShardflowError::Fetch`]
async fn fetch_isolated<J: DataflowJob>(job: &J, context: &ShardingContext) -> Result<Vec<J::Item>> {
    match AssertUnwindSafe(job.fetch_data(context)).catch_unwind().await {
        Ok(fetched) => Ok(fetched.map_err(as_fetch_error)?.unwrap_or_default()),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(
                job_name = %context.job_name(),
                handler = job.handler_name(),
                panic = %message,
                "Fetch panicked"
            );
            Err(ShardflowError::Fetch(format!("fetch panicked: {message}")))
        }
    }
}

fn as_fetch_error(error: ShardflowError) -> ShardflowError {
    match error {
        ShardflowError::Fetch(_) => error,
        other => ShardflowError::Fetch(other.to_string()),
    }
}
