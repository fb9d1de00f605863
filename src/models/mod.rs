//! # Models
//!
//! Value types that flow through one invocation: the sharding context handed over by
//! the scheduler and the statistics produced by dispatch.

pub mod sharding_context;
pub mod statistics;

pub use sharding_context::{ShardItem, ShardingContext};
pub use statistics::{ExecutionCounters, ExecutionStatistics, ProcessOutcome};
