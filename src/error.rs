//! Error types and error handling for the searchpool crate.
//!
//! This module defines the error taxonomy used throughout the
//! pool: provisioning, index open/create, writer backpressure and
//! write-failure rollback. Translation into HTTP status codes or
//! framework-level failure responses is the embedding application's
//! concern.

use thiserror::Error;

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Main error type for the searchpool crate
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Invalid index name: {0}")]
    InvalidName(String),

    #[error("Provisioning failed: {0}")]
    ProvisionFailed(String),

    #[error("Index directory is not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Failed to open index: {0}")]
    IndexOpen(String),

    #[error("Index is open: {0}")]
    IndexInUse(String),

    #[error("Writer busy for index: {0}")]
    WriterBusy(String),

    #[error("Write failed: {0}")]
    WriteFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PoolError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(self, PoolError::UnknownIndex(_))
    }

    /// Check if this is a backpressure rejection
    pub fn is_busy(&self) -> bool {
        matches!(self, PoolError::WriterBusy(_))
    }

    /// Check if this is a failed write callback (rollback was performed)
    pub fn is_write_failure(&self) -> bool {
        matches!(self, PoolError::WriteFailed(_))
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(self, PoolError::InvalidName(_) | PoolError::ConfigError(_))
    }
}
