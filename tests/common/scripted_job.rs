use async_trait::async_trait;
use parking_lot::Mutex;
use shardflow_core::{
    DataflowJob, OffsetWriter, ProcessOutcome, Result, ShardItem, ShardflowError, ShardingContext,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use super::HighWaterMark;

/// Scripted answer to one fetch call
#[derive(Debug, Clone)]
pub enum FetchScript {
    Absent,
    Batch(Vec<u32>),
    Fail(String),
    Panic(String),
}

impl FetchScript {
    pub fn batch(items: impl IntoIterator<Item = u32>) -> Self {
        FetchScript::Batch(items.into_iter().collect())
    }
}

/// What the job saw when a fetch was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchObservation {
    pub sharding_items: Vec<ShardItem>,
    /// Items still being processed when the fetch started
    pub in_flight: usize,
    /// Items fully processed before the fetch started
    pub processed_before: usize,
}

/// Job double driven by fetch scripts and per-item behaviour sets
#[derive(Debug, Default)]
pub struct ScriptedJob {
    fetches: Mutex<VecDeque<FetchScript>>,
    per_item_fetches: Mutex<HashMap<ShardItem, VecDeque<FetchScript>>>,
    failing: HashSet<u32>,
    rejected: HashSet<u32>,
    panicking: HashSet<u32>,
    process_delay: Option<Duration>,
    /// When set, item `n` records offset `"offset-n"` for the first shard item of its context
    offset_writer: Option<OffsetWriter>,
    processed: Mutex<Vec<u32>>,
    processed_contexts: Mutex<Vec<(u32, Vec<ShardItem>)>>,
    fetch_observations: Mutex<Vec<FetchObservation>>,
    in_flight: HighWaterMark,
}

impl ScriptedJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetches(self, scripts: impl IntoIterator<Item = FetchScript>) -> Self {
        *self.fetches.lock() = scripts.into_iter().collect();
        self
    }

    pub fn item_fetches(
        self,
        item: ShardItem,
        scripts: impl IntoIterator<Item = FetchScript>,
    ) -> Self {
        self.per_item_fetches
            .lock()
            .insert(item, scripts.into_iter().collect());
        self
    }

    pub fn failing(mut self, items: impl IntoIterator<Item = u32>) -> Self {
        self.failing.extend(items);
        self
    }

    pub fn rejecting(mut self, items: impl IntoIterator<Item = u32>) -> Self {
        self.rejected.extend(items);
        self
    }

    pub fn panicking(mut self, items: impl IntoIterator<Item = u32>) -> Self {
        self.panicking.extend(items);
        self
    }

    pub fn with_process_delay(mut self, delay: Duration) -> Self {
        self.process_delay = Some(delay);
        self
    }

    pub fn with_offset_writer(mut self, writer: OffsetWriter) -> Self {
        self.offset_writer = Some(writer);
        self
    }

    pub fn processed(&self) -> Vec<u32> {
        self.processed.lock().clone()
    }

    pub fn processed_sorted(&self) -> Vec<u32> {
        let mut items = self.processed();
        items.sort_unstable();
        items
    }

    pub fn process_calls(&self) -> usize {
        self.processed.lock().len()
    }

    pub fn times_processed(&self, item: u32) -> usize {
        self.processed.lock().iter().filter(|p| **p == item).count()
    }

    pub fn processed_contexts(&self) -> Vec<(u32, Vec<ShardItem>)> {
        self.processed_contexts.lock().clone()
    }

    pub fn fetch_observations(&self) -> Vec<FetchObservation> {
        self.fetch_observations.lock().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_observations.lock().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.in_flight.highest()
    }

    fn next_script(&self, context: &ShardingContext) -> FetchScript {
        if let [item] = context.sharding_items() {
            if let Some(queue) = self.per_item_fetches.lock().get_mut(item) {
                return queue.pop_front().unwrap_or(FetchScript::Absent);
            }
        }
        self.fetches
            .lock()
            .pop_front()
            .unwrap_or(FetchScript::Absent)
    }
}

#[async_trait]
impl DataflowJob for ScriptedJob {
    type Item = u32;

    async fn fetch_data(&self, context: &ShardingContext) -> Result<Option<Vec<u32>>> {
        self.fetch_observations.lock().push(FetchObservation {
            sharding_items: context.sharding_items().to_vec(),
            in_flight: self.in_flight.current(),
            processed_before: self.processed.lock().len(),
        });

        match self.next_script(context) {
            FetchScript::Absent => Ok(None),
            FetchScript::Batch(items) => Ok(Some(items)),
            FetchScript::Fail(message) => Err(ShardflowError::Fetch(message)),
            FetchScript::Panic(message) => panic!("{message}"),
        }
    }

    async fn process_data(&self, context: &ShardingContext, item: u32) -> Result<ProcessOutcome> {
        self.in_flight.enter();
        if let Some(delay) = self.process_delay {
            tokio::time::sleep(delay).await;
        }
        self.processed.lock().push(item);
        self.processed_contexts
            .lock()
            .push((item, context.sharding_items().to_vec()));
        self.in_flight.exit();

        if let (Some(writer), Some(shard)) = (&self.offset_writer, context.sharding_items().first()) {
            writer.update(*shard, &format!("offset-{item}")).await?;
        }

        if self.panicking.contains(&item) {
            panic!("item {item} blew up");
        }
        if self.failing.contains(&item) {
            return Err(anyhow::anyhow!("item {item} failed").into());
        }
        if self.rejected.contains(&item) {
            return Ok(ProcessOutcome::Failure);
        }
        Ok(ProcessOutcome::Success)
    }
}
