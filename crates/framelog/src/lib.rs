//! # `framelog`
//!
//! Capture and analysis of method-frame traces over an indexed append-only
//! record log.
//!
//! A session has exactly two phases:
//!
//! ```text
//! ┌──────────────────────────────┐  snapshot  ┌──────────────────────────────┐
//! │           Capture            │ ─────────→ │           Analysis           │
//! │ append records, index keys   │  save/load │ load index, seeked lookups   │
//! └──────────────────────────────┘            └──────────────────────────────┘
//! ```
//!
//! - **Capture** appends records to the data log and inserts each record's
//!   `(key, offset)` into the ordered index. [`Capture::finish`] snapshots the
//!   index and ends the phase.
//! - **Analysis** reloads the snapshot in full and reads records by key with
//!   one seek each.
//!
//! # Quick Start
//!
//! ```ignore
//! use framelog::{Analysis, FramelogConfig, RecordKey, capture_demo};
//!
//! let config = FramelogConfig::new("saucisse.data", "saucisse.index");
//! capture_demo(&config)?;
//!
//! let mut analysis = Analysis::open(&config)?;
//! let record = analysis.lookup(RecordKey::new(5000))?;
//! ```

mod analysis;
mod capture;
mod config;
mod demo;
mod error;

pub use analysis::{Analysis, KeyReport, boundary_keys};
pub use capture::{Capture, CaptureSummary};
pub use config::FramelogConfig;
pub use demo::{capture_demo, demo_records, demo_signature};
pub use error::{FramelogError, Result};

// Re-export core types
pub use framelog_types::{FrameSignature, IndexEntry, LogRecord, Offset, RecordKey, RecordTag};

// Re-export storage types
pub use framelog_storage::{DecodeError, OrderedIndex, StorageError};

#[cfg(test)]
mod tests;
