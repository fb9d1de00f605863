//! Configuration Error Types
//!
//! Errors raised while loading and validating dataflow configuration.

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The underlying configuration sources could not be read or merged
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// A source was read but could not be mapped onto the configuration schema
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            context: context.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        match error {
            config::ConfigError::Type { .. } | config::ConfigError::Message(_) => {
                ConfigurationError::DeserializationError(error.to_string())
            }
            other => ConfigurationError::LoadError(other.to_string()),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
