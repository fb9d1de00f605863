//! # Dataflow Job Traits
//!
//! Defines the hooks a user job provides and a closure-based adapter for jobs that
//! do not need their own type.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

use crate::error::Result;
use crate::models::{ProcessOutcome, ShardingContext};

/// User-supplied data acquisition and processing logic
///
/// `fetch_data` may be called repeatedly within one invocation (streaming mode) and
/// `process_data` is called concurrently for different items, so implementations
/// must be safe to share across worker tasks.
#[async_trait]
pub trait DataflowJob: Send + Sync + 'static {
    /// The unit of work handed to `process_data`
    type Item: Send + 'static;

    /// Acquire the next batch for the shard items in `context`
    ///
    /// `Ok(None)` and `Ok(Some(vec![]))` both mean "no work".
    async fn fetch_data(&self, context: &ShardingContext) -> Result<Option<Vec<Self::Item>>>;

    /// Process one item
    ///
    /// `Ok(ProcessOutcome::Failure)`, an `Err` and a panic are all counted as a
    /// failure of this item only.
    async fn process_data(&self, context: &ShardingContext, item: Self::Item)
        -> Result<ProcessOutcome>;

    /// Name used in logs
    fn handler_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A [`DataflowJob`] assembled from a fetch closure and a process closure
pub struct FnDataflowJob<T, F, P> {
    fetch: F,
    process: P,
    _item: PhantomData<fn() -> T>,
}

/// Build a job from a pair of closures
///
/// The closures return owned futures, so anything they need from the context must be
/// copied out before the `async` block.
pub fn job_fn<T, F, FFut, P, PFut>(fetch: F, process: P) -> FnDataflowJob<T, F, P>
where
    T: Send + 'static,
    F: Fn(&ShardingContext) -> FFut + Send + Sync + 'static,
    FFut: Future<Output = Result<Option<Vec<T>>>> + Send + 'static,
    P: Fn(T) -> PFut + Send + Sync + 'static,
    PFut: Future<Output = Result<ProcessOutcome>> + Send + 'static,
{
    FnDataflowJob {
        fetch,
        process,
        _item: PhantomData,
    }
}

#[async_trait]
impl<T, F, FFut, P, PFut> DataflowJob for FnDataflowJob<T, F, P>
where
    T: Send + 'static,
    F: Fn(&ShardingContext) -> FFut + Send + Sync + 'static,
    FFut: Future<Output = Result<Option<Vec<T>>>> + Send + 'static,
    P: Fn(T) -> PFut + Send + Sync + 'static,
    PFut: Future<Output = Result<ProcessOutcome>> + Send + 'static,
{
    type Item = T;

    async fn fetch_data(&self, context: &ShardingContext) -> Result<Option<Vec<T>>> {
        (self.fetch)(context).await
    }

    async fn process_data(&self, _context: &ShardingContext, item: T) -> Result<ProcessOutcome> {
        (self.process)(item).await
    }

    fn handler_name(&self) -> &'static str {
        "fn_dataflow_job"
    }
}
