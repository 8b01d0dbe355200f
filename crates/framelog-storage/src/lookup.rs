//! Keyed record retrieval.

use framelog_types::{IndexEntry, LogRecord, RecordKey};

use crate::{LogReader, OrderedIndex, StorageError};

/// Reads the record stored under `key`.
///
/// # Errors
///
/// - [`StorageError::KeyNotFound`] if `key` has no index entry; the index and
///   log are untouched and later lookups proceed normally
/// - any [`StorageError::Io`] or [`StorageError::Decode`] from
///   [`LogReader::read_at`], unchanged
pub fn lookup(
    index: &OrderedIndex,
    log: &mut LogReader,
    key: RecordKey,
) -> Result<LogRecord, StorageError> {
    lookup_entry(index, log, key).map(|(_, record)| record)
}

/// Like [`lookup`], but also returns the index entry the record was read from.
pub fn lookup_entry(
    index: &OrderedIndex,
    log: &mut LogReader,
    key: RecordKey,
) -> Result<(IndexEntry, LogRecord), StorageError> {
    let offset = index.get(key).ok_or(StorageError::KeyNotFound(key))?;
    let record = log.read_at(offset)?;
    Ok((IndexEntry::new(key, offset), record))
}
