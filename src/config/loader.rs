//! Configuration Loader
//!
//! Layers an optional configuration file under `SHARDFLOW__*` environment variables
//! and validates the merged result.

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use super::error::ConfigResult;
use super::ShardflowConfig;
use crate::constants::env;

/// Builder-style loader over the `config` crate
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    /// Replaces the process environment as the variable source when set
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration file; the format is inferred from its extension
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Read variables from the given map instead of the process environment
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    pub fn load(&self) -> ConfigResult<ShardflowConfig> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            debug!(path = %path.display(), "Adding configuration file source");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(env::CONFIG_PREFIX)
                .separator(env::CONFIG_SEPARATOR)
                .try_parsing(true)
                .source(self.env_source.clone()),
        );

        let config: ShardflowConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            execution_mode = %config.execution_mode,
            dataflow_type = %config.dataflow_type,
            misfire_policy = %config.misfire_policy,
            default_concurrency = config.default_concurrency,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}
