//! Append-only data log.
//!
//! [`AppendLog`] is the write side used while building: records are appended
//! strictly in order and each append reports the byte offset at which the
//! record starts. [`LogReader`] is the read side used while querying: it seeks
//! to an offset taken from the index and decodes exactly one record.
//!
//! # Invariants
//!
//! - Records are append-only; existing bytes are never modified
//! - The offset returned by [`AppendLog::append`] equals the log length
//!   immediately before the write, so offsets are strictly increasing
//! - An offset stays valid for the lifetime of the file

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use framelog_types::{LogRecord, Offset};

use crate::{DecodeError, StorageError, codec};

/// Write side of the data log.
#[derive(Debug)]
pub struct AppendLog {
    file: File,
    path: PathBuf,
    /// Current length in bytes; the offset of the next append.
    len: u64,
    /// Whether each append is followed by `sync_data`.
    fsync: bool,
}

impl AppendLog {
    /// Creates a new, empty log at `path`, truncating any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be created.
    pub fn create(path: impl Into<PathBuf>, fsync: bool) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        tracing::debug!(path = %path.display(), fsync, "created data log");

        Ok(Self {
            file,
            path,
            len: 0,
            fsync,
        })
    }

    /// Opens an existing log for further appends.
    ///
    /// The next append lands at the current end of the file.
    pub fn open(path: impl Into<PathBuf>, fsync: bool) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new().append(true).open(&path)?;
        let len = file.metadata()?.len();

        tracing::debug!(path = %path.display(), len, "opened data log for append");

        Ok(Self {
            file,
            path,
            len,
            fsync,
        })
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current length of the log in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if nothing has been written to the log.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends an encoded record and returns the offset it starts at.
    ///
    /// The bytes are written unbuffered and flushed before returning (and
    /// synced when the log was opened with `fsync`), so the reported offset
    /// always matches the record's position on disk.
    ///
    /// # Errors
    ///
    /// Returns an [`io::ErrorKind::InvalidInput`] error without writing if
    /// `bytes` is empty; every encoding has at least a header.
    pub fn append(&mut self, bytes: &[u8]) -> Result<Offset, StorageError> {
        if bytes.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot append an empty encoding",
            )
            .into());
        }

        let offset = i64::try_from(self.len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "data log length exceeds the offset range",
            )
        })?;

        self.file.write_all(bytes)?;
        self.file.flush()?;
        if self.fsync {
            self.file.sync_data()?;
        }

        let prev_len = self.len;
        self.len += bytes.len() as u64;

        // Postcondition: offsets are strictly increasing
        debug_assert!(self.len > prev_len);

        tracing::trace!(offset, len = bytes.len(), "appended record");
        Ok(Offset::new(offset))
    }

    /// Encodes `record` and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::RecordTooLarge`] without writing if the body
    /// exceeds [`codec::MAX_BODY_LEN`], since the record could never be read
    /// back.
    pub fn append_record(&mut self, record: &LogRecord) -> Result<Offset, StorageError> {
        let size = codec::body_len(record);
        if size > codec::MAX_BODY_LEN {
            return Err(StorageError::RecordTooLarge {
                size,
                max: codec::MAX_BODY_LEN,
            });
        }
        self.append(&codec::encode(record))
    }

    /// Forces all written data to stable storage.
    pub fn sync(&mut self) -> Result<(), StorageError> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// Read side of the data log.
#[derive(Debug)]
pub struct LogReader {
    file: File,
    path: PathBuf,
}

impl LogReader {
    /// Opens the log at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self { file, path })
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record that starts at `offset`.
    ///
    /// Seeks to `offset` and decodes exactly one record, leaving the file
    /// positioned directly after it.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`] if the seek or read fails
    /// - [`StorageError::Decode`] if the bytes at `offset` are not a valid
    ///   record; an offset at or past the end of the log is
    ///   [`DecodeError::Truncated`], a negative offset is
    ///   [`DecodeError::Malformed`]
    pub fn read_at(&mut self, offset: Offset) -> Result<LogRecord, StorageError> {
        let position = offset
            .as_u64()
            .ok_or_else(|| DecodeError::malformed(format!("negative log offset {offset}")))?;

        self.file.seek(SeekFrom::Start(position))?;
        codec::decode(&mut self.file)
    }

    /// Decodes the whole log sequentially from the first byte.
    ///
    /// The file is read into memory once; records are decoded lazily as the
    /// returned iterator advances.
    pub fn scan(&self) -> Result<LogScan, StorageError> {
        let data: Bytes = fs::read(&self.path)?.into();
        Ok(LogScan::new(data))
    }
}

/// Sequential iterator over `(offset, record)` pairs of a log image.
///
/// Stops at the end of the data. A decode failure is yielded once, after
/// which the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct LogScan {
    data: Bytes,
    pos: usize,
    failed: bool,
}

impl LogScan {
    /// Creates a scan over an in-memory log image.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }
}

impl Iterator for LogScan {
    type Item = Result<(Offset, LogRecord), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }

        // Record byte position BEFORE parsing (this is where the record starts)
        let offset = Offset::new(self.pos as i64);
        match codec::decode_slice(&self.data[self.pos..]) {
            Ok((record, consumed)) => {
                self.pos += consumed;
                Some(Ok((offset, record)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for LogScan {}
