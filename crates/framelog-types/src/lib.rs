//! # framelog-types: Core types for `framelog`
//!
//! This crate contains the shared types used across the `framelog` system:
//! - Index identifiers ([`RecordKey`], [`Offset`], [`IndexEntry`])
//! - Log payloads ([`LogRecord`], [`RecordTag`], [`FrameSignature`])

use std::fmt::Display;

use serde::{Deserialize, Serialize};

// ============================================================================
// Index IDs - All Copy (cheap 4/8-byte values)
// ============================================================================

/// Logical record number.
///
/// Keys are assigned by the caller, typically sequentially from some starting
/// value. Every `i32` is a legal key, including zero and negatives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RecordKey(i32);

impl RecordKey {
    pub fn new(key: i32) -> Self {
        Self(key)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns the next key, or `None` on overflow.
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Returns the previous key, or `None` on overflow.
    pub fn checked_prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for RecordKey {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<RecordKey> for i32 {
    fn from(key: RecordKey) -> Self {
        key.0
    }
}

/// Byte position of a record's first byte within the data log.
///
/// Uses i64 internally (signed 64-bit, matching file seek positions).
/// Offsets handed out by the log are never negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Offset(i64);

impl Offset {
    pub const ZERO: Offset = Offset(0);

    pub fn new(offset: i64) -> Self {
        debug_assert!(offset >= 0, "Offset cannot be negative");
        Self(offset)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns the offset as an unsigned file position, or `None` if negative.
    pub fn as_u64(&self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }
}

impl Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Offset {
    fn from(value: i64) -> Self {
        debug_assert!(value >= 0, "Offset cannot be negative");
        Self(value)
    }
}

impl From<Offset> for i64 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}

/// A `(key, offset)` pair stored in the ordered index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: RecordKey,
    pub offset: Offset,
}

impl IndexEntry {
    pub fn new(key: RecordKey, offset: Offset) -> Self {
        Self { key, offset }
    }
}

// ============================================================================
// Record Tag - Copy (one-byte discriminant)
// ============================================================================

/// Discriminant byte identifying which [`LogRecord`] variant an encoding holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordTag {
    /// A method frame was entered.
    BeginFrame = b'B',
    /// A method frame was left.
    EndFrame = b'E',
    /// A 64-bit integer variable changed value.
    I64Change = b'I',
}

impl RecordTag {
    /// Every known tag, in discriminant order.
    pub const ALL: [RecordTag; 3] = [
        RecordTag::BeginFrame,
        RecordTag::EndFrame,
        RecordTag::I64Change,
    ];

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parses a discriminant byte. Returns `None` for unknown tags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(RecordTag::BeginFrame),
            b'E' => Some(RecordTag::EndFrame),
            b'I' => Some(RecordTag::I64Change),
            _ => None,
        }
    }
}

impl Display for RecordTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordTag::BeginFrame => write!(f, "begin frame"),
            RecordTag::EndFrame => write!(f, "end frame"),
            RecordTag::I64Change => write!(f, "i64 change"),
        }
    }
}

// ============================================================================
// Log Records - Clone (frame variants hold Strings)
// ============================================================================

/// Fully qualified identity of the method a frame belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameSignature {
    /// Internal class name, e.g. `java/lang/String`.
    pub class_name: String,
    /// Method name, e.g. `getBytes`.
    pub method_name: String,
    /// Method descriptor, e.g. `()[B`.
    pub method_type: String,
}

impl FrameSignature {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        method_type: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            method_type: method_type.into(),
        }
    }
}

impl Display for FrameSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}{}",
            self.class_name, self.method_name, self.method_type
        )
    }
}

/// One payload written to the data log.
///
/// The set of variants is closed; each maps to exactly one [`RecordTag`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogRecord {
    BeginFrame(FrameSignature),
    EndFrame(FrameSignature),
    I64Change { old: i64, new: i64 },
}

impl LogRecord {
    /// Returns the discriminant for this variant.
    pub fn tag(&self) -> RecordTag {
        match self {
            LogRecord::BeginFrame(_) => RecordTag::BeginFrame,
            LogRecord::EndFrame(_) => RecordTag::EndFrame,
            LogRecord::I64Change { .. } => RecordTag::I64Change,
        }
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogRecord::BeginFrame(sig) | LogRecord::EndFrame(sig) => {
                write!(f, "{}: FQN = {sig}", self.tag())
            }
            LogRecord::I64Change { old, new } => {
                write!(f, "{}: old = {old}, new = {new}", self.tag())
            }
        }
    }
}
