//! Sharding context for a single invocation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Identifier of one shard item
pub type ShardItem = u32;

/// Which shard items this node processes for one invocation
///
/// Built by the scheduler before the trigger is delivered and read-only afterwards.
/// Shard items are kept sorted and unique, including after deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawShardingContext")]
pub struct ShardingContext {
    job_name: String,
    sharding_total_count: u32,
    job_parameter: String,
    sharding_items: Vec<ShardItem>,
    item_parameters: BTreeMap<ShardItem, String>,
    /// Resume positions known when the trigger fired
    offsets: BTreeMap<ShardItem, String>,
}

impl ShardingContext {
    pub fn new(job_name: impl Into<String>, sharding_items: impl IntoIterator<Item = ShardItem>) -> Self {
        let sharding_items: Vec<ShardItem> = sharding_items
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let sharding_total_count = u32::try_from(sharding_items.len()).unwrap_or(u32::MAX);

        Self {
            job_name: job_name.into(),
            sharding_total_count,
            job_parameter: String::new(),
            sharding_items,
            item_parameters: BTreeMap::new(),
            offsets: BTreeMap::new(),
        }
    }

    pub fn with_sharding_total_count(mut self, total: u32) -> Self {
        self.sharding_total_count = total;
        self
    }

    pub fn with_job_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.job_parameter = parameter.into();
        self
    }

    pub fn with_item_parameter(mut self, item: ShardItem, parameter: impl Into<String>) -> Self {
        self.item_parameters.insert(item, parameter.into());
        self
    }

    pub fn with_offset(mut self, item: ShardItem, offset: impl Into<String>) -> Self {
        self.offsets.insert(item, offset.into());
        self
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn sharding_total_count(&self) -> u32 {
        self.sharding_total_count
    }

    pub fn job_parameter(&self) -> &str {
        &self.job_parameter
    }

    pub fn sharding_items(&self) -> &[ShardItem] {
        &self.sharding_items
    }

    pub fn item_parameter(&self, item: ShardItem) -> Option<&str> {
        self.item_parameters.get(&item).map(String::as_str)
    }

    pub fn offset(&self, item: ShardItem) -> Option<&str> {
        self.offsets.get(&item).map(String::as_str)
    }

    pub fn offsets(&self) -> &BTreeMap<ShardItem, String> {
        &self.offsets
    }

    pub fn is_empty(&self) -> bool {
        self.sharding_items.is_empty()
    }

    /// Narrow this context down to one of its shard items
    ///
    /// The item parameter and offset of that item carry over; the others are dropped.
    /// Returns `None` when the item is not assigned to this context.
    pub fn for_item(&self, item: ShardItem) -> Option<ShardingContext> {
        if self.sharding_items.binary_search(&item).is_err() {
            return None;
        }

        let mut item_parameters = BTreeMap::new();
        if let Some(parameter) = self.item_parameters.get(&item) {
            item_parameters.insert(item, parameter.clone());
        }
        let mut offsets = BTreeMap::new();
        if let Some(offset) = self.offsets.get(&item) {
            offsets.insert(item, offset.clone());
        }

        Some(ShardingContext {
            job_name: self.job_name.clone(),
            sharding_total_count: self.sharding_total_count,
            job_parameter: self.job_parameter.clone(),
            sharding_items: vec![item],
            item_parameters,
            offsets,
        })
    }
}

/// Wire form of [`ShardingContext`]; items may arrive unsorted or repeated
#[derive(Deserialize)]
struct RawShardingContext {
    job_name: String,
    #[serde(default)]
    sharding_total_count: Option<u32>,
    #[serde(default)]
    job_parameter: String,
    sharding_items: Vec<ShardItem>,
    #[serde(default)]
    item_parameters: BTreeMap<ShardItem, String>,
    #[serde(default)]
    offsets: BTreeMap<ShardItem, String>,
}

impl From<RawShardingContext> for ShardingContext {
    fn from(raw: RawShardingContext) -> Self {
        let mut context = ShardingContext::new(raw.job_name, raw.sharding_items)
            .with_job_parameter(raw.job_parameter);
        if let Some(total) = raw.sharding_total_count {
            context.sharding_total_count = total;
        }
        context.item_parameters = raw.item_parameters;
        context.offsets = raw.offsets;
        context
    }
}
