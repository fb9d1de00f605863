//! # Processing Metrics
//!
//! Caller-owned monitoring sink for processed-item counts. The executor merges the
//! statistics of every dispatch into it; monitoring reads it after an invocation.

pub mod process_count;

pub use process_count::{ProcessCountSnapshot, ProcessCountStatistics};
