//! Error types for the dataflow execution core.

use thiserror::Error;

use crate::config::ConfigurationError;

#[derive(Error, Debug)]
pub enum ShardflowError {
    /// The user fetch hook failed; there is no batch to isolate the failure in.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A single item failed to process. Never escapes a dispatch.
    #[error("Process error: {0}")]
    Process(String),

    /// A job facade call (misfire, offsets, concurrency) failed.
    #[error("Facade error: {0}")]
    Facade(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<ConfigurationError> for ShardflowError {
    fn from(error: ConfigurationError) -> Self {
        ShardflowError::Configuration(error.to_string())
    }
}

impl From<tokio::task::JoinError> for ShardflowError {
    fn from(error: tokio::task::JoinError) -> Self {
        ShardflowError::Internal(format!("Worker task failed to join: {error}"))
    }
}

impl ShardflowError {
    /// Whether the error came from the job facade rather than user hooks
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ShardflowError::Facade(_))
    }
}

pub type Result<T> = std::result::Result<T, ShardflowError>;
