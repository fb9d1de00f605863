//! In-process [`JobFacade`] backed by concurrent maps.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

use super::JobFacade;
use crate::config::ShardflowConfig;
use crate::error::{Result, ShardflowError};
use crate::models::ShardItem;

/// Keeps misfire flags, offsets and the concurrency level in memory
///
/// Suitable for single-node deployments and tests. A misfire is reported when any of
/// the queried shard items is flagged.
#[derive(Debug)]
pub struct InMemoryJobFacade {
    misfired: Mutex<HashSet<ShardItem>>,
    offsets: DashMap<ShardItem, String>,
    concurrency_level: AtomicUsize,
    eligible: AtomicBool,
}

impl Default for InMemoryJobFacade {
    fn default() -> Self {
        Self::new(1)
    }
}

impl InMemoryJobFacade {
    pub fn new(concurrency_level: usize) -> Self {
        Self {
            misfired: Mutex::new(HashSet::new()),
            offsets: DashMap::new(),
            concurrency_level: AtomicUsize::new(concurrency_level),
            eligible: AtomicBool::new(true),
        }
    }

    pub fn from_config(config: &ShardflowConfig) -> Self {
        Self::new(config.default_concurrency)
    }

    /// Flag these shard items as misfired, as a scheduler would on an overlapping trigger
    pub fn set_misfire(&self, sharding_items: &[ShardItem]) {
        self.misfired.lock().extend(sharding_items.iter().copied());
    }

    pub fn is_flagged(&self, item: ShardItem) -> bool {
        self.misfired.lock().contains(&item)
    }

    pub fn set_concurrency_level(&self, level: usize) {
        self.concurrency_level.store(level, Ordering::Release);
    }

    /// Stop or resume streaming loops that consult this facade
    pub fn set_eligible(&self, eligible: bool) {
        self.eligible.store(eligible, Ordering::Release);
    }

    pub fn offset(&self, item: ShardItem) -> Option<String> {
        self.offsets.get(&item).map(|entry| entry.value().clone())
    }

    pub fn offsets(&self) -> BTreeMap<ShardItem, String> {
        self.offsets
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

#[async_trait]
impl JobFacade for InMemoryJobFacade {
    async fn is_misfire(&self, sharding_items: &[ShardItem]) -> Result<bool> {
        let misfired = self.misfired.lock();
        Ok(sharding_items.iter().any(|item| misfired.contains(item)))
    }

    async fn clear_misfire(&self, sharding_items: &[ShardItem]) -> Result<()> {
        let mut misfired = self.misfired.lock();
        for item in sharding_items {
            misfired.remove(item);
        }
        Ok(())
    }

    async fn concurrency_level(&self) -> Result<usize> {
        match self.concurrency_level.load(Ordering::Acquire) {
            0 => Err(ShardflowError::InvalidConfiguration(
                "concurrency level must be at least 1".to_string(),
            )),
            level => Ok(level),
        }
    }

    async fn update_offset(&self, item: ShardItem, offset: &str) -> Result<()> {
        debug!(item = item, offset = %offset, "Updating shard offset");
        self.offsets.insert(item, offset.to_string());
        Ok(())
    }

    async fn is_eligible_for_job_running(&self) -> Result<bool> {
        Ok(self.eligible.load(Ordering::Acquire))
    }
}
