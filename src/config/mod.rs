//! # Dataflow Configuration
//!
//! Settings that decide how a trigger is turned into fetch/process cycles. Every
//! field has a default so an empty source yields a usable configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shardflow_core::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().with_file("config/shardflow.toml").load()?;
//! println!("mode = {}", config.execution_mode);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::constants::{DataflowType, ExecutionMode, MisfirePolicy};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration for a dataflow job executor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShardflowConfig {
    /// One cycle per trigger, or loop until a fetch comes back empty
    pub execution_mode: ExecutionMode,

    /// Whole-shard-set batches or per-shard-item sequences
    pub dataflow_type: DataflowType,

    /// Behavior when the facade reports a misfire at trigger time
    pub misfire_policy: MisfirePolicy,

    /// Concurrency level served by the in-memory facade
    pub default_concurrency: usize,
}

impl Default for ShardflowConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::Throughput,
            dataflow_type: DataflowType::Batch,
            misfire_policy: MisfirePolicy::Skip,
            default_concurrency: 1,
        }
    }
}

impl ShardflowConfig {
    pub fn streaming() -> Self {
        Self {
            execution_mode: ExecutionMode::Streaming,
            ..Self::default()
        }
    }

    pub fn with_dataflow_type(mut self, dataflow_type: DataflowType) -> Self {
        self.dataflow_type = dataflow_type;
        self
    }

    pub fn with_misfire_policy(mut self, misfire_policy: MisfirePolicy) -> Self {
        self.misfire_policy = misfire_policy;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "default_concurrency",
                self.default_concurrency,
                "concurrency level must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShardflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.execution_mode, ExecutionMode::Throughput);
        assert_eq!(config.default_concurrency, 1);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ShardflowConfig {
            default_concurrency: 0,
            ..ShardflowConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_concurrency"));
    }

    #[test]
    fn test_builders() {
        let config = ShardflowConfig::streaming()
            .with_dataflow_type(DataflowType::Sequence)
            .with_misfire_policy(MisfirePolicy::Execute);
        assert!(config.execution_mode.is_streaming());
        assert_eq!(config.dataflow_type, DataflowType::Sequence);
        assert_eq!(config.misfire_policy, MisfirePolicy::Execute);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_value(ShardflowConfig::streaming()).unwrap();
        assert_eq!(json["execution_mode"], "streaming");
        assert_eq!(json["dataflow_type"], "batch");

        let parsed: ShardflowConfig =
            serde_json::from_str(r#"{"misfire_policy": "execute"}"#).unwrap();
        assert_eq!(parsed.misfire_policy, MisfirePolicy::Execute);
        assert_eq!(parsed.execution_mode, ExecutionMode::Throughput);
    }
}
