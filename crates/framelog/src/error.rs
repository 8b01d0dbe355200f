//! Error types for the framelog phases.
//!
//! Wraps storage errors and adds the configuration failures that can occur
//! before a phase starts.

use std::path::PathBuf;

use framelog_storage::StorageError;
use thiserror::Error;

/// Result type for framelog operations.
pub type Result<T> = std::result::Result<T, FramelogError>;

/// Errors that can occur while capturing or analyzing.
#[derive(Debug, Error)]
pub enum FramelogError {
    /// Error from the storage layer (data log, index, snapshot).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration values are inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`FramelogConfig`](crate::FramelogConfig).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl FramelogError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
