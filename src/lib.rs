#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Shardflow Core
//!
//! Execution core of a shardable job scheduler: once a trigger fires on a node for a
//! set of assigned shard items, this crate runs the job's data-processing logic
//! concurrently and resiliently.
//!
//! ## Overview
//!
//! A job supplies two hooks through [`DataflowJob`]: `fetch_data` acquires a batch of
//! items for the assigned shards and `process_data` handles a single item. The
//! [`DataflowExecutor`] drives those hooks for each trigger:
//!
//! - **Throughput mode** runs one fetch/process cycle per trigger.
//! - **Streaming mode** keeps fetching and processing until a fetch returns no data.
//!
//! Each fetched batch is fanned out by the [`ConcurrentDispatcher`] over as many
//! worker tasks as the [`JobFacade`] reports for the concurrency level. A failing item
//! is counted and never aborts its siblings. Misfire flags are always released at
//! the end of an invocation, and success/failure counts are reported both as the
//! return value of `execute` and into a [`ProcessCountStatistics`] sink.
//!
//! ## Module Organization
//!
//! - [`client`] - Job hook traits
//! - [`facade`] - Coordination boundary (misfire, offsets, concurrency)
//! - [`orchestration`] - Executor and dispatcher
//! - [`models`] - Sharding context and statistics values
//! - [`metrics`] - Process-wide statistics sink
//! - [`config`] - Configuration loading
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use shardflow_core::{
//!     job_fn, DataflowExecutor, InMemoryJobFacade, ProcessOutcome, ShardflowConfig,
//!     ShardflowError, ShardingContext,
//! };
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let job = Arc::new(job_fn(
//!     |_context: &ShardingContext| async { Ok::<_, ShardflowError>(Some(vec![1_u32, 2, 3, 4])) },
//!     |item: u32| async move { Ok::<_, ShardflowError>(ProcessOutcome::from(item != 3)) },
//! ));
//! let facade = Arc::new(InMemoryJobFacade::new(2));
//! let executor = DataflowExecutor::new(job, facade, ShardflowConfig::default()).unwrap();
//!
//! let stats = executor.execute(ShardingContext::new("demo", [0, 1])).await.unwrap();
//! assert_eq!((stats.success_count, stats.failure_count), (3, 1));
//! # });
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod facade;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod orchestration;

pub use client::{job_fn, DataflowJob, FnDataflowJob};
pub use config::{ConfigLoader, ConfigurationError, ShardflowConfig};
pub use constants::{DataflowType, ExecutionMode, MisfirePolicy};
pub use error::{Result, ShardflowError};
pub use facade::{InMemoryJobFacade, JobFacade, OffsetWriter};
pub use metrics::{ProcessCountSnapshot, ProcessCountStatistics};
pub use models::{ExecutionStatistics, ProcessOutcome, ShardItem, ShardingContext};
pub use orchestration::{ConcurrentDispatcher, DataflowExecutor, StopSignal};
