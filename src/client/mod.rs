//! # Job Hooks
//!
//! The capability interface user jobs implement to plug into the execution core: a
//! `fetch` that acquires a batch for the assigned shards and a `process` that handles
//! one item of it.
//!
//! ## Usage
//!
//! ```rust
//! use shardflow_core::client::DataflowJob;
//! use shardflow_core::models::{ProcessOutcome, ShardingContext};
//!
//! struct Doubler;
//!
//! #[async_trait::async_trait]
//! impl DataflowJob for Doubler {
//!     type Item = u64;
//!
//!     async fn fetch_data(&self, context: &ShardingContext) -> shardflow_core::Result<Option<Vec<u64>>> {
//!         Ok(Some(context.sharding_items().iter().map(|item| u64::from(*item)).collect()))
//!     }
//!
//!     async fn process_data(&self, _context: &ShardingContext, item: u64) -> shardflow_core::Result<ProcessOutcome> {
//!         Ok(ProcessOutcome::from(item * 2 < 100))
//!     }
//! }
//! ```

pub mod traits;

pub use traits::{job_fn, DataflowJob, FnDataflowJob};
