//! Querying phase.
//!
//! An [`Analysis`] loads the index snapshot once, opens the data log
//! read-only, and answers keyed lookups. Neither the index nor the log is
//! modified while querying.

use std::fmt::{self, Display};

use framelog_storage::{LogReader, OrderedIndex, SnapshotStore, StorageError, lookup_entry};
use framelog_types::{IndexEntry, LogRecord, RecordKey};
use tracing::{info, warn};

use crate::config::FramelogConfig;
use crate::error::Result;

/// Result of reporting a single key.
#[derive(Debug)]
pub enum KeyReport {
    /// The key was indexed and its record decoded.
    Found { entry: IndexEntry, record: LogRecord },
    /// The key was absent or its record could not be decoded.
    Failed { key: RecordKey, error: StorageError },
}

impl KeyReport {
    /// Returns the key this report is about.
    pub fn key(&self) -> RecordKey {
        match self {
            KeyReport::Found { entry, .. } => entry.key,
            KeyReport::Failed { key, .. } => *key,
        }
    }

    /// Returns the decoded record, if the lookup succeeded.
    pub fn record(&self) -> Option<&LogRecord> {
        match self {
            KeyReport::Found { record, .. } => Some(record),
            KeyReport::Failed { .. } => None,
        }
    }
}

impl Display for KeyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyReport::Found { entry, record } => write!(
                f,
                "record {}, datafile offset {}: {record}",
                entry.key, entry.offset
            ),
            KeyReport::Failed { key, error } => write!(f, "record {key}: {error}"),
        }
    }
}

/// Keys just outside the indexed range, which must not be found.
///
/// Returns the key before the smallest and the key after the largest indexed
/// key, skipping either one that would overflow. An empty index yields none.
pub fn boundary_keys(index: &OrderedIndex) -> Vec<RecordKey> {
    let (Some(first), Some(last)) = (index.first_key(), index.last_key()) else {
        return Vec::new();
    };
    [first.checked_prev(), last.checked_next()]
        .into_iter()
        .flatten()
        .collect()
}

/// A read-only query session over a completed capture.
#[derive(Debug)]
pub struct Analysis {
    index: OrderedIndex,
    log: LogReader,
}

impl Analysis {
    /// Loads the index snapshot and opens the data log named in `config`.
    pub fn open(config: &FramelogConfig) -> Result<Self> {
        let index = SnapshotStore::new(&config.index_path).load()?;
        let log = LogReader::open(&config.data_path)?;

        info!(
            data = %config.data_path.display(),
            entries = index.len(),
            "analysis opened"
        );
        Ok(Self { index, log })
    }

    /// Returns the loaded index.
    pub fn index(&self) -> &OrderedIndex {
        &self.index
    }

    /// Reads the record stored under `key`.
    pub fn lookup(&mut self, key: RecordKey) -> std::result::Result<LogRecord, StorageError> {
        framelog_storage::lookup(&self.index, &mut self.log, key)
    }

    /// Reads the record stored under `key` together with its index entry.
    pub fn lookup_entry(
        &mut self,
        key: RecordKey,
    ) -> std::result::Result<(IndexEntry, LogRecord), StorageError> {
        lookup_entry(&self.index, &mut self.log, key)
    }

    /// Looks up every key in order and reports each outcome.
    ///
    /// Missing keys and undecodable records are reported per key and the
    /// session continues. An I/O error aborts the report.
    pub fn report<I>(&mut self, keys: I) -> Result<Vec<KeyReport>>
    where
        I: IntoIterator<Item = RecordKey>,
    {
        let mut reports = Vec::new();
        for key in keys {
            match self.lookup_entry(key) {
                Ok((entry, record)) => reports.push(KeyReport::Found { entry, record }),
                Err(error) if error.is_fatal() => return Err(error.into()),
                Err(error) => {
                    warn!(%key, %error, "lookup failed");
                    reports.push(KeyReport::Failed { key, error });
                }
            }
        }
        Ok(reports)
    }
}
