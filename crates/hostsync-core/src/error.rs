//! Error types for the hostsync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

use crate::traits::address_source::SourceError;
use crate::traits::host_registry::HostId;

/// Result type alias for hostsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the hostsync system
#[derive(Error, Debug)]
pub enum Error {
    /// Address lookup errors (unreachable service or malformed response)
    #[error("address source error: {0}")]
    AddressSource(#[from] SourceError),

    /// State store-related errors
    #[error("state store error: {0}")]
    StateStore(String),

    /// Host registry-related errors
    #[error("host registry error: {0}")]
    HostRegistry(String),

    /// History log-related errors
    #[error("history log error: {0}")]
    HistoryLog(String),

    /// Settings provider errors
    #[error("settings error: {0}")]
    Settings(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// A host id that is not present in the registry
    #[error("host not found: {0}")]
    HostNotFound(HostId),

    /// I/O errors from file-backed collaborators
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a host registry error
    pub fn host_registry(msg: impl Into<String>) -> Self {
        Self::HostRegistry(msg.into())
    }

    /// Create a history log error
    pub fn history_log(msg: impl Into<String>) -> Self {
        Self::HistoryLog(msg.into())
    }

    /// Create a settings error
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
