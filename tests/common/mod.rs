#![allow(dead_code)]

pub mod recording_facade;
pub mod scripted_job;

pub use recording_facade::*;
pub use scripted_job::*;

use shardflow_core::ShardingContext;

/// Context with shard items 0 and 1, the usual assignment in these tests
pub fn two_shard_context(job_name: &str) -> ShardingContext {
    ShardingContext::new(job_name, [0, 1])
        .with_sharding_total_count(2)
        .with_job_parameter("param")
}
