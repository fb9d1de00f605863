//! # Concurrent Dispatcher
//!
//! Fans a fetched batch out over a bounded set of worker tasks and counts the
//! outcome of every item.
//!
//! Each worker owns a disjoint partition of the batch and processes it in order.
//! A failing item (an `Err`, a `Failure` outcome or a panic) is recorded and the
//! worker moves on to the next item. [`ConcurrentDispatcher::dispatch`] returns only
//! after every worker has been joined, so the returned statistics are final.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::client::DataflowJob;
use crate::error::{Result, ShardflowError};
use crate::models::{ExecutionCounters, ExecutionStatistics, ProcessOutcome, ShardingContext};

/// Items owned by exactly one worker, with the context they are processed under
#[derive(Debug)]
pub struct Partition<T> {
    pub context: Arc<ShardingContext>,
    pub items: Vec<T>,
}

impl<T> Partition<T> {
    pub fn new(context: Arc<ShardingContext>, items: Vec<T>) -> Self {
        Self { context, items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Dispatches batches of a job's items to short-lived worker tasks
pub struct ConcurrentDispatcher<J: DataflowJob> {
    job: Arc<J>,
}

impl<J: DataflowJob> ConcurrentDispatcher<J> {
    pub fn new(job: Arc<J>) -> Self {
        Self { job }
    }

    /// Process `batch` with `worker_count` workers under one shared context
    ///
    /// A worker count of 1 goes through the same worker machinery as any other.
    /// Fewer workers than requested are started when the batch is smaller than the
    /// worker count, since a worker never runs without items.
    #[instrument(skip(self, context, batch), fields(job_name = %context.job_name(), batch_size = batch.len()))]
    pub async fn dispatch(
        &self,
        context: Arc<ShardingContext>,
        batch: Vec<J::Item>,
        worker_count: usize,
    ) -> Result<ExecutionStatistics> {
        if worker_count < 1 {
            return Err(ShardflowError::InvalidConfiguration(format!(
                "worker count must be at least 1, got {worker_count}"
            )));
        }

        let partitions = partition_items(batch, worker_count)
            .into_iter()
            .map(|items| Partition::new(Arc::clone(&context), items))
            .collect();

        self.dispatch_partitions(partitions).await
    }

    /// Run one worker per non-empty partition and join them all
    pub async fn dispatch_partitions(
        &self,
        partitions: Vec<Partition<J::Item>>,
    ) -> Result<ExecutionStatistics> {
        let counters = Arc::new(ExecutionCounters::new());
        let mut handles = Vec::with_capacity(partitions.len());

        for (worker_index, partition) in partitions.into_iter().enumerate() {
            if partition.is_empty() {
                continue;
            }
            let job = Arc::clone(&self.job);
            let counters = Arc::clone(&counters);
            handles.push(tokio::spawn(async move {
                run_worker(worker_index, job, partition, counters).await
            }));
        }

        let worker_count = handles.len();
        debug!(worker_count = worker_count, "Dispatching batch to workers");

        // Join every worker before reporting, even when one of them could not be joined
        let mut join_failure = None;
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Dispatch worker failed to join");
                join_failure.get_or_insert(e);
            }
        }
        if let Some(e) = join_failure {
            return Err(e.into());
        }

        let stats = counters.snapshot();
        debug!(
            worker_count = worker_count,
            success_count = stats.success_count,
            failure_count = stats.failure_count,
            "Dispatch completed"
        );
        Ok(stats)
    }
}

async fn run_worker<J: DataflowJob>(
    worker_index: usize,
    job: Arc<J>,
    partition: Partition<J::Item>,
    counters: Arc<ExecutionCounters>,
) {
    let Partition { context, items } = partition;
    let item_count = items.len();

    for item in items {
        let outcome = process_isolated(job.as_ref(), &context, item).await;
        counters.record(outcome);
    }

    debug!(
        worker_index = worker_index,
        item_count = item_count,
        "Worker drained its partition"
    );
}

/// Run the process hook for one item, turning errors and panics into a failure outcome
async fn process_isolated<J: DataflowJob>(
    job: &J,
    context: &ShardingContext,
    item: J::Item,
) -> ProcessOutcome {
    match AssertUnwindSafe(job.process_data(context, item))
        .catch_unwind()
        .await
    {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!(
                job_name = %context.job_name(),
                handler = job.handler_name(),
                error = %e,
                "Item processing failed"
            );
            ProcessOutcome::Failure
        }
        Err(panic) => {
            error!(
                job_name = %context.job_name(),
                handler = job.handler_name(),
                panic = %panic_message(panic.as_ref()),
                "Item processing panicked"
            );
            ProcessOutcome::Failure
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Split `items` into at most `worker_count` contiguous, non-empty partitions
///
/// Partition sizes differ by at most one; earlier partitions take the remainder.
pub fn partition_items<T>(items: Vec<T>, worker_count: usize) -> Vec<Vec<T>> {
    if items.is_empty() || worker_count == 0 {
        return Vec::new();
    }

    let workers = worker_count.min(items.len());
    let base = items.len() / workers;
    let remainder = items.len() % workers;

    let mut partitions = Vec::with_capacity(workers);
    let mut iter = items.into_iter();
    for index in 0..workers {
        let size = base + usize::from(index < remainder);
        partitions.push(iter.by_ref().take(size).collect());
    }
    partitions
}
