//! Index snapshot persistence.
//!
//! The [`SnapshotStore`] writes an entire [`OrderedIndex`] to one file after
//! building completes, and reconstructs it in full for querying.
//!
//! # File Format
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │  Offset    │  Size   │  Description                   │
//! ├───────────────────────────────────────────────────────┤
//! │  0         │  4      │  Magic bytes: "FLXI"           │
//! │  4         │  1      │  Version: 0x01                 │
//! │  5         │  3      │  Reserved (zero padding)       │
//! │  8         │  8      │  Entry count (u64 LE)          │
//! │  16        │  12*N   │  Entries [(key:i32, off:i64)]  │
//! │  16+12*N   │  4      │  CRC32 of bytes 0..(16+12*N)   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are stored in ascending key order, exactly as produced by
//! [`OrderedIndex::ascend`].

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut};
use framelog_types::{Offset, RecordKey};

use crate::{DecodeError, OrderedIndex, StorageError};

// ============================================================================
// File Format Constants
// ============================================================================

/// Magic bytes identifying a valid index snapshot.
const MAGIC: &[u8; 4] = b"FLXI";

/// Current snapshot format version.
const VERSION: u8 = 0x01;

/// Reserved bytes for future use.
const RESERVED: [u8; 3] = [0u8; 3];

const MAGIC_SIZE: usize = 4;
const VERSION_SIZE: usize = 1;
const RESERVED_SIZE: usize = 3;
const COUNT_SIZE: usize = 8; // u64
const KEY_SIZE: usize = 4; // i32
const OFFSET_SIZE: usize = 8; // i64
const ENTRY_SIZE: usize = KEY_SIZE + OFFSET_SIZE;
const CRC_SIZE: usize = 4; // u32

/// Header size: magic(4) + version(1) + reserved(3) + count(8) = 16 bytes
const HEADER_SIZE: usize = MAGIC_SIZE + VERSION_SIZE + RESERVED_SIZE + COUNT_SIZE;

/// Reads and writes index snapshots at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store for the snapshot file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the scratch file a save writes before renaming.
    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Persists the whole index as one unit.
    ///
    /// The snapshot is written to `<path>.tmp`, synced, and then renamed over
    /// `path`, so a reader never observes a partially written snapshot.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be written or renamed.
    pub fn save(&self, index: &OrderedIndex) -> Result<u64, StorageError> {
        let buf = Self::encode(index);
        let tmp_path = self.temp_path();

        let replaced =
            write_synced(&tmp_path, &buf).and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(e) = replaced {
            // Best effort; the original error is what matters.
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::info!(
            path = %self.path.display(),
            entries = index.len(),
            bytes = buf.len(),
            "saved index snapshot"
        );
        Ok(buf.len() as u64)
    }

    /// Loads the snapshot and rebuilds the index from it.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`] if the file cannot be read
    /// - [`StorageError::Decode`] if the contents are not a valid snapshot
    pub fn load(&self) -> Result<OrderedIndex, StorageError> {
        let data = fs::read(&self.path)?;
        let index = Self::decode(&data)?;

        tracing::info!(
            path = %self.path.display(),
            entries = index.len(),
            "loaded index snapshot"
        );
        Ok(index)
    }

    /// Serializes `index` into the snapshot byte format.
    pub fn encode(index: &OrderedIndex) -> Vec<u8> {
        let total_size = HEADER_SIZE + index.len() * ENTRY_SIZE + CRC_SIZE;
        let mut buf: Vec<u8> = Vec::with_capacity(total_size);

        // Write header
        buf.put_slice(MAGIC);
        buf.put_u8(VERSION);
        buf.put_slice(&RESERVED);
        buf.put_u64_le(index.len() as u64);

        // Write entries in ascending key order
        for entry in index.ascend() {
            buf.put_i32_le(entry.key.as_i32());
            buf.put_i64_le(entry.offset.as_i64());
        }

        // Write CRC32 checksum of everything before it
        let checksum = crc32fast::hash(&buf);
        buf.put_u32_le(checksum);

        // Postcondition: buffer size matches expected
        debug_assert_eq!(buf.len(), total_size, "buffer size mismatch");
        buf
    }

    /// Parses snapshot bytes and re-inserts every entry in stored order.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Truncated`] if `data` is shorter than its header claims
    /// - [`DecodeError::Malformed`] for a bad magic, version or checksum,
    ///   trailing bytes, keys out of ascending order, or negative offsets
    pub fn decode(data: &[u8]) -> Result<OrderedIndex, DecodeError> {
        // Validate minimum size (header only, no entries yet)
        if data.len() < HEADER_SIZE + CRC_SIZE {
            return Err(DecodeError::Truncated);
        }

        let mut header = &data[..HEADER_SIZE];

        // Validate magic bytes
        if &header[..MAGIC_SIZE] != MAGIC {
            return Err(DecodeError::malformed("invalid index magic bytes"));
        }
        header.advance(MAGIC_SIZE);

        // Validate version
        let version = header.get_u8();
        if version != VERSION {
            return Err(DecodeError::malformed(format!(
                "unsupported index version: {version}"
            )));
        }
        header.advance(RESERVED_SIZE);

        // Read count and compute expected size
        let count = usize::try_from(header.get_u64_le())
            .map_err(|_| DecodeError::malformed("index entry count overflows usize"))?;
        let expected_size = count
            .checked_mul(ENTRY_SIZE)
            .and_then(|n| n.checked_add(HEADER_SIZE + CRC_SIZE))
            .ok_or_else(|| DecodeError::malformed("index entry count overflows usize"))?;

        if data.len() < expected_size {
            return Err(DecodeError::Truncated);
        }
        if data.len() > expected_size {
            return Err(DecodeError::malformed(format!(
                "{} trailing bytes after index snapshot",
                data.len() - expected_size
            )));
        }

        // Verify CRC32 before trusting any entry
        let crc_start = expected_size - CRC_SIZE;
        let stored_crc = (&data[crc_start..]).get_u32_le();
        let computed_crc = crc32fast::hash(&data[..crc_start]);
        if stored_crc != computed_crc {
            return Err(DecodeError::malformed(format!(
                "index checksum mismatch: expected {stored_crc:#010x}, got {computed_crc:#010x}"
            )));
        }

        let mut entries = &data[HEADER_SIZE..crc_start];
        let mut index = OrderedIndex::new();
        let mut prev_key: Option<RecordKey> = None;

        for _ in 0..count {
            let key = RecordKey::new(entries.get_i32_le());
            let offset = entries.get_i64_le();

            if prev_key.is_some_and(|prev| key <= prev) {
                return Err(DecodeError::malformed(format!(
                    "index keys out of order at key {key}"
                )));
            }
            if offset < 0 {
                return Err(DecodeError::malformed(format!(
                    "negative offset {offset} for key {key}"
                )));
            }

            index.insert_or_replace(key, Offset::new(offset));
            prev_key = Some(key);
        }

        // Postcondition: we read exactly `count` distinct entries
        debug_assert_eq!(index.len(), count, "entry count mismatch");
        Ok(index)
    }
}

fn write_synced(path: &Path, buf: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(buf)?;
    file.flush()?;
    file.sync_all()
}
