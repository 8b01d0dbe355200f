//! framelog-storage: Append-only record log with an ordered offset index
//!
//! This crate implements the storage core of `framelog`. Records are appended
//! to a data log in a self-describing binary format; an ordered index maps each
//! record's logical key to its byte offset, is snapshotted once after
//! building, and is reloaded in full for random-access queries.
//!
//! # Record Format
//!
//! Each record is stored as:
//! ```text
//! [tag:u8][length:u32][body:bytes][crc32:u32]
//!    1B       4B        variable     4B
//! ```
//!
//! See [`codec`] for the body layouts.
//!
//! # File Layout
//!
//! ```text
//! saucisse.data    <- append-only data log
//! saucisse.index   <- index snapshot (key -> offset)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use framelog_storage::{AppendLog, LogReader, OrderedIndex, SnapshotStore, lookup};
//! use framelog_types::{LogRecord, RecordKey};
//!
//! // Build
//! let mut log = AppendLog::create("saucisse.data", false)?;
//! let mut index = OrderedIndex::new();
//! let offset = log.append_record(&LogRecord::I64Change { old: 0, new: 1 })?;
//! index.insert_or_replace(RecordKey::new(1), offset);
//! SnapshotStore::new("saucisse.index").save(&index)?;
//!
//! // Query
//! let index = SnapshotStore::new("saucisse.index").load()?;
//! let mut reader = LogReader::open("saucisse.data")?;
//! let record = lookup(&index, &mut reader, RecordKey::new(1))?;
//! ```

// Modules
pub mod codec;
mod error;
mod index;
mod log;
mod lookup;
mod snapshot;

// Re-exports
pub use error::{DecodeError, StorageError};
pub use index::OrderedIndex;
pub use log::{AppendLog, LogReader, LogScan};
pub use lookup::{lookup, lookup_entry};
pub use snapshot::SnapshotStore;
