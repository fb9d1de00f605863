//! # System Constants
//!
//! Enums and well-known names that define how a dataflow job is driven.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ShardflowError;

/// Environment variables read by the crate
pub mod env {
    pub const ENVIRONMENT: &str = "SHARDFLOW_ENV";
    pub const LOG_FILTER: &str = "SHARDFLOW_LOG";
    pub const LOG_FORMAT: &str = "SHARDFLOW_LOG_FORMAT";
    pub const CONFIG_PREFIX: &str = "SHARDFLOW";
    pub const CONFIG_SEPARATOR: &str = "__";
}

/// How many fetch/process cycles a single trigger performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One fetch/process cycle per trigger
    #[default]
    Throughput,
    /// Keep fetching and processing until a fetch yields no data
    Streaming,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Throughput => "throughput",
            ExecutionMode::Streaming => "streaming",
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, ExecutionMode::Streaming)
    }
}

/// How fetched data is grouped before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataflowType {
    /// One fetch for the whole shard set, fanned out over the configured worker count
    #[default]
    Batch,
    /// One fetch per shard item, each item's data handled by its own worker in order
    Sequence,
}

impl DataflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataflowType::Batch => "batch",
            DataflowType::Sequence => "sequence",
        }
    }
}

/// What an invocation does when the facade reports a misfire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisfirePolicy {
    /// Skip fetch and dispatch, only release the flag
    #[default]
    Skip,
    /// Run normally and release the flag afterwards
    Execute,
}

impl MisfirePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MisfirePolicy::Skip => "skip",
            MisfirePolicy::Execute => "execute",
        }
    }
}

macro_rules! impl_display_from_str {
    ($ty:ty, $($name:literal => $variant:expr),+ $(,)?) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ShardflowError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(ShardflowError::InvalidConfiguration(format!(
                        "Unknown {}: {other}",
                        stringify!($ty)
                    ))),
                }
            }
        }
    };
}

impl_display_from_str!(ExecutionMode,
    "throughput" => ExecutionMode::Throughput,
    "streaming" => ExecutionMode::Streaming,
);

impl_display_from_str!(DataflowType,
    "batch" => DataflowType::Batch,
    "sequence" => DataflowType::Sequence,
);

impl_display_from_str!(MisfirePolicy,
    "skip" => MisfirePolicy::Skip,
    "execute" => MisfirePolicy::Execute,
);
