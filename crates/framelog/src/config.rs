//! Phase configuration.

use std::path::{Path, PathBuf};

use framelog_types::RecordKey;
use serde::{Deserialize, Serialize};

use crate::error::{FramelogError, Result};

/// Configuration shared by the capture and analysis phases.
///
/// Both phases must be given the same `data_path` / `index_path` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramelogConfig {
    /// Path of the append-only data log.
    pub data_path: PathBuf,
    /// Path of the index snapshot.
    pub index_path: PathBuf,
    /// Number of value-change records the demonstration capture writes
    /// between its begin and end frames.
    pub record_count: u32,
    /// Key assigned to the first record.
    pub first_key: i32,
    /// Number of random keys the analysis phase reports.
    pub sample_count: usize,
    /// Sync the data log after every append.
    pub fsync: bool,
}

impl FramelogConfig {
    /// Creates a configuration for the given file pair with default counts.
    pub fn new(data_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            index_path: index_path.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FramelogError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of value-change records.
    pub fn with_record_count(mut self, count: u32) -> Self {
        self.record_count = count;
        self
    }

    /// Sets the key of the first record.
    pub fn with_first_key(mut self, key: i32) -> Self {
        self.first_key = key;
        self
    }

    /// Sets the number of random samples reported by analysis.
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Enables or disables syncing after every append.
    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    /// Checks that the configured key range fits in a [`RecordKey`].
    pub fn validate(&self) -> Result<()> {
        if self.data_path == self.index_path {
            return Err(FramelogError::config(
                "data log and index snapshot must be different files",
            ));
        }
        self.last_key().map(|_| ())
    }

    /// Key of the begin-frame record.
    pub fn first_key(&self) -> RecordKey {
        RecordKey::new(self.first_key)
    }

    /// Key of the end-frame record: one past the last value change.
    pub fn last_key(&self) -> Result<RecordKey> {
        let last = i64::from(self.first_key) + i64::from(self.record_count) + 1;
        i32::try_from(last).map(RecordKey::new).map_err(|_| {
            FramelogError::config(format!(
                "{} records starting at key {} overflow the key range",
                self.record_count, self.first_key
            ))
        })
    }
}

impl Default for FramelogConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./saucisse.data"),
            index_path: PathBuf::from("./saucisse.index"),
            record_count: 10_000,
            first_key: 1,
            sample_count: 20,
            fsync: false,
        }
    }
}
