//! # Job Facade
//!
//! The boundary between the execution core and the coordination layer that owns
//! misfire flags, offsets and the configured concurrency level. The core only calls
//! through [`JobFacade`]; where and how that state is persisted is up to the
//! implementation.

pub mod in_memory;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ShardItem, ShardingContext};

pub use in_memory::InMemoryJobFacade;

/// Coordination services consumed by the executor
///
/// Errors from any of these calls are infrastructure faults and are surfaced to the
/// caller unchanged.
#[async_trait]
pub trait JobFacade: Send + Sync {
    /// Whether a trigger for these shard items arrived while a previous run was in flight
    async fn is_misfire(&self, sharding_items: &[ShardItem]) -> Result<bool>;

    /// Release the misfire flag for these shard items
    async fn clear_misfire(&self, sharding_items: &[ShardItem]) -> Result<()>;

    /// Number of workers to use for the next dispatch; read fresh on every fetch cycle
    async fn concurrency_level(&self) -> Result<usize>;

    /// Persist the resume position of a shard item
    async fn update_offset(&self, item: ShardItem, offset: &str) -> Result<()>;

    /// Called before the first fetch of an invocation that is not skipped
    async fn before_job_executed(&self, context: &ShardingContext) -> Result<()> {
        let _ = context;
        Ok(())
    }

    /// Called after the last dispatch of an invocation that was not skipped
    async fn after_job_executed(&self, context: &ShardingContext) -> Result<()> {
        let _ = context;
        Ok(())
    }

    /// Consulted between streaming cycles; `Ok(false)` ends the loop, an error fails it
    async fn is_eligible_for_job_running(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Handle that lets job hooks persist offsets while they process items
///
/// Cloneable and cheap; every call is forwarded to the facade as-is.
#[derive(Clone)]
pub struct OffsetWriter {
    facade: Arc<dyn JobFacade>,
}

impl OffsetWriter {
    pub fn new(facade: Arc<dyn JobFacade>) -> Self {
        Self { facade }
    }

    pub async fn update(&self, item: ShardItem, offset: &str) -> Result<()> {
        self.facade.update_offset(item, offset).await
    }
}

impl std::fmt::Debug for OffsetWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffsetWriter").finish_non_exhaustive()
    }
}
