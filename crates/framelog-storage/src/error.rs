//! Error types for storage operations.

use std::io;

use framelog_types::RecordKey;

/// Errors that can occur during storage operations.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    /// Filesystem I/O error on the data log or the index file.
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),

    /// A record or snapshot encoding is inconsistent.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The requested key has no entry in the index.
    #[error("key not found: {0}")]
    KeyNotFound(RecordKey),

    /// A record body is larger than the decoder accepts, so it was not written.
    #[error("record body of {size} bytes exceeds limit of {max}")]
    RecordTooLarge { size: usize, max: usize },
}

impl StorageError {
    /// Returns true if this is a missing-key result rather than a failure.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, StorageError::KeyNotFound(_))
    }

    /// Returns true if the error should abort the current phase.
    ///
    /// Only I/O failures are fatal. Decode errors and missing keys concern a
    /// single lookup and leave the index and log usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Io(_))
    }
}

/// Encoding inconsistencies detected while decoding records or snapshots.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The discriminant byte matches no known record variant.
    #[error("unknown record type tag {tag:#04x}")]
    UnknownType { tag: u8 },

    /// The input ended before the encoding was complete.
    #[error("truncated encoding")]
    Truncated,

    /// The encoding is structurally invalid.
    #[error("malformed encoding: {reason}")]
    Malformed { reason: String },
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            reason: reason.into(),
        }
    }
}
