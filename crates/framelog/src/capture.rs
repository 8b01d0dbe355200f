//! Building phase.
//!
//! A [`Capture`] owns the data log and the in-memory index while records are
//! appended. [`Capture::finish`] snapshots the index and consumes the capture,
//! so a log/index pair can only be queried after building has completed.

use std::fs;
use std::io;

use framelog_storage::{AppendLog, OrderedIndex, SnapshotStore, StorageError};
use framelog_types::{LogRecord, Offset, RecordKey};
use tracing::{debug, info};

use crate::config::FramelogConfig;
use crate::error::Result;

/// Outcome of a completed capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Number of distinct keys in the saved index.
    pub entries: usize,
    /// Length of the data log in bytes.
    pub log_bytes: u64,
    /// Size of the index snapshot in bytes.
    pub index_bytes: u64,
    /// Smallest and largest key, if any record was written.
    pub key_range: Option<(RecordKey, RecordKey)>,
}

/// An in-progress build of a data log and its index.
///
/// Dropping a capture without calling [`finish`](Self::finish) leaves the
/// partial data log behind but no index snapshot.
#[derive(Debug)]
pub struct Capture {
    log: AppendLog,
    index: OrderedIndex,
    snapshot: SnapshotStore,
}

impl Capture {
    /// Starts a new build, truncating the data log and discarding any
    /// snapshot left by an earlier build.
    pub fn create(config: &FramelogConfig) -> Result<Self> {
        config.validate()?;

        // A stale snapshot would point into the log we are about to truncate.
        match fs::remove_file(&config.index_path) {
            Ok(()) => debug!(path = %config.index_path.display(), "removed stale index snapshot"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e).into()),
        }

        let log = AppendLog::create(&config.data_path, config.fsync)?;
        info!(
            data = %config.data_path.display(),
            index = %config.index_path.display(),
            "capture started"
        );

        Ok(Self {
            log,
            index: OrderedIndex::new(),
            snapshot: SnapshotStore::new(&config.index_path),
        })
    }

    /// Appends `record` to the log and indexes it under `key`.
    ///
    /// Re-using a key replaces its index entry; the earlier record stays in
    /// the log but is no longer reachable by key.
    pub fn append(&mut self, key: RecordKey, record: &LogRecord) -> Result<Offset> {
        let offset = self.log.append_record(record)?;
        if let Some(previous) = self.index.insert_or_replace(key, offset) {
            debug!(%key, %previous, %offset, "key re-used, index entry replaced");
        }
        Ok(offset)
    }

    /// Returns the index built so far.
    pub fn index(&self) -> &OrderedIndex {
        &self.index
    }

    /// Syncs the data log and saves the index snapshot.
    ///
    /// The snapshot is only written after every record is on stable storage.
    pub fn finish(mut self) -> Result<CaptureSummary> {
        self.log.sync()?;
        let index_bytes = self.snapshot.save(&self.index)?;

        let summary = CaptureSummary {
            entries: self.index.len(),
            log_bytes: self.log.len(),
            index_bytes,
            key_range: self.index.first_key().zip(self.index.last_key()),
        };

        info!(
            entries = summary.entries,
            log_bytes = summary.log_bytes,
            index_bytes = summary.index_bytes,
            "capture finished"
        );
        Ok(summary)
    }
}
