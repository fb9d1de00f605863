//! # Orchestration
//!
//! The per-trigger execution engine: [`DataflowExecutor`] drives fetch/process cycles
//! and [`ConcurrentDispatcher`] fans each fetched batch out over worker tasks.

pub mod dispatcher;
pub mod executor;

pub use dispatcher::{partition_items, ConcurrentDispatcher, Partition};
pub use executor::{DataflowExecutor, StopSignal};
