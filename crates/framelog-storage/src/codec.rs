//! Record codec for the data log.
//!
//! Every [`LogRecord`] is written as a self-delimiting frame:
//!
//! ```text
//! [tag:u8][length:u32][body:bytes][crc32:u32]
//!   1B       4B        variable     4B
//! ```
//!
//! - **tag**: the [`RecordTag`] discriminant (`B`, `E` or `I`)
//! - **length**: size of the body in bytes
//! - **body**: variant fields (see below)
//! - **crc32**: checksum of tag + length + body
//!
//! Body layouts, all integers little-endian:
//!
//! ```text
//! B, E: [class_len:u32][class][method_len:u32][method][type_len:u32][type]
//! I:    [old:i64][new:i64]
//! ```
//!
//! The tag is checked before the length is trusted, so an unknown tag is
//! reported as [`DecodeError::UnknownType`] without interpreting any of the
//! bytes that follow it.

use std::io::{self, Read};

use bytes::{Buf, BufMut};
use framelog_types::{FrameSignature, LogRecord, RecordTag};

use crate::{DecodeError, StorageError};

// Byte sizes of the frame fields
const TAG_SIZE: usize = 1;
const LENGTH_SIZE: usize = 4; // u32
const CRC_SIZE: usize = 4; // u32

/// Header size: tag(1) + length(4) = 5 bytes
pub const HEADER_SIZE: usize = TAG_SIZE + LENGTH_SIZE;

/// Largest body the decoder accepts. Guards allocations against a corrupted
/// length field.
pub const MAX_BODY_LEN: usize = 16 * 1024 * 1024;

/// Body size of an [`LogRecord::I64Change`]: old(8) + new(8).
const I64_CHANGE_BODY_SIZE: usize = 16;

/// Encodes a record into its on-disk frame.
///
/// The frame only decodes again if [`body_len`] is at most [`MAX_BODY_LEN`];
/// [`AppendLog::append_record`](crate::AppendLog::append_record) refuses
/// anything larger.
pub fn encode(record: &LogRecord) -> Vec<u8> {
    let body = encode_body(record);
    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len() + CRC_SIZE);

    buf.put_u8(record.tag().as_byte());
    buf.put_u32_le(body.len() as u32);
    buf.put_slice(&body);

    let crc = crc32fast::hash(&buf);
    buf.put_u32_le(crc);

    debug_assert_eq!(buf.len(), encoded_len(record));
    buf
}

/// Returns the number of bytes [`encode`] produces for `record`.
pub fn encoded_len(record: &LogRecord) -> usize {
    HEADER_SIZE + body_len(record) + CRC_SIZE
}

/// Returns the size of the body [`encode`] writes for `record`.
///
/// Only records whose body is at most [`MAX_BODY_LEN`] decode again.
pub fn body_len(record: &LogRecord) -> usize {
    match record {
        LogRecord::BeginFrame(sig) | LogRecord::EndFrame(sig) => {
            3 * LENGTH_SIZE + sig.class_name.len() + sig.method_name.len() + sig.method_type.len()
        }
        LogRecord::I64Change { .. } => I64_CHANGE_BODY_SIZE,
    }
}

fn encode_body(record: &LogRecord) -> Vec<u8> {
    let mut body = Vec::new();
    match record {
        LogRecord::BeginFrame(sig) | LogRecord::EndFrame(sig) => {
            for field in [&sig.class_name, &sig.method_name, &sig.method_type] {
                body.put_u32_le(field.len() as u32);
                body.put_slice(field.as_bytes());
            }
        }
        LogRecord::I64Change { old, new } => {
            body.put_i64_le(*old);
            body.put_i64_le(*new);
        }
    }
    body
}

/// Decodes exactly one record from `reader`.
///
/// The reader is left positioned directly after the record. Nothing beyond
/// the frame is consumed, so the reader should not be a read-ahead buffer
/// shared with other positional reads.
///
/// # Errors
///
/// - [`DecodeError::UnknownType`] if the tag byte is not a known variant
/// - [`DecodeError::Truncated`] if the stream ends inside the frame
/// - [`DecodeError::Malformed`] on CRC mismatch or an inconsistent body
/// - [`StorageError::Io`] for any other read failure
pub fn decode<R: Read>(reader: &mut R) -> Result<LogRecord, StorageError> {
    let mut header = [0u8; HEADER_SIZE];

    read_exact(reader, &mut header[..TAG_SIZE])?;
    let tag = parse_tag(header[0])?;

    read_exact(reader, &mut header[TAG_SIZE..])?;
    let length = parse_length(&header)?;

    let mut rest = vec![0u8; length + CRC_SIZE];
    read_exact(reader, &mut rest)?;

    let (body, crc_bytes) = rest.split_at(length);
    verify_crc(&header, body, crc_bytes)?;

    Ok(decode_body(tag, body)?)
}

/// Decodes one record from the front of `data`.
///
/// Returns the record and the number of bytes consumed.
///
/// # Errors
///
/// Same decode conditions as [`decode`]; there is no I/O involved.
pub fn decode_slice(data: &[u8]) -> Result<(LogRecord, usize), DecodeError> {
    let tag_byte = *data.first().ok_or(DecodeError::Truncated)?;
    let tag = parse_tag(tag_byte)?;

    if data.len() < HEADER_SIZE {
        return Err(DecodeError::Truncated);
    }
    let length = parse_length(&data[..HEADER_SIZE])?;

    let total_size = HEADER_SIZE + length + CRC_SIZE;
    if data.len() < total_size {
        return Err(DecodeError::Truncated);
    }

    let body = &data[HEADER_SIZE..HEADER_SIZE + length];
    verify_crc(&data[..HEADER_SIZE], body, &data[HEADER_SIZE + length..total_size])?;

    Ok((decode_body(tag, body)?, total_size))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), StorageError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            StorageError::Decode(DecodeError::Truncated)
        } else {
            StorageError::Io(e)
        }
    })
}

fn parse_tag(byte: u8) -> Result<RecordTag, DecodeError> {
    RecordTag::from_byte(byte).ok_or(DecodeError::UnknownType { tag: byte })
}

fn parse_length(header: &[u8]) -> Result<usize, DecodeError> {
    let mut length_bytes = &header[TAG_SIZE..HEADER_SIZE];
    let length = length_bytes.get_u32_le() as usize;
    if length > MAX_BODY_LEN {
        return Err(DecodeError::malformed(format!(
            "record body of {length} bytes exceeds limit of {MAX_BODY_LEN}"
        )));
    }
    Ok(length)
}

fn verify_crc(header: &[u8], body: &[u8], mut crc_bytes: &[u8]) -> Result<(), DecodeError> {
    let stored = crc_bytes.get_u32_le();

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(header);
    hasher.update(body);
    let computed = hasher.finalize();

    if stored != computed {
        return Err(DecodeError::malformed(format!(
            "record checksum mismatch: expected {stored:#010x}, got {computed:#010x}"
        )));
    }
    Ok(())
}

fn decode_body(tag: RecordTag, mut body: &[u8]) -> Result<LogRecord, DecodeError> {
    let record = match tag {
        RecordTag::BeginFrame => LogRecord::BeginFrame(read_signature(&mut body)?),
        RecordTag::EndFrame => LogRecord::EndFrame(read_signature(&mut body)?),
        RecordTag::I64Change => {
            if body.len() != I64_CHANGE_BODY_SIZE {
                return Err(DecodeError::malformed(format!(
                    "i64 change body must be {I64_CHANGE_BODY_SIZE} bytes, got {}",
                    body.len()
                )));
            }
            let old = body.get_i64_le();
            let new = body.get_i64_le();
            LogRecord::I64Change { old, new }
        }
    };

    if body.has_remaining() {
        return Err(DecodeError::malformed(format!(
            "{} trailing bytes in {tag} body",
            body.remaining()
        )));
    }
    Ok(record)
}

fn read_signature(body: &mut &[u8]) -> Result<FrameSignature, DecodeError> {
    let class_name = read_string(body, "class name")?;
    let method_name = read_string(body, "method name")?;
    let method_type = read_string(body, "method type")?;
    Ok(FrameSignature {
        class_name,
        method_name,
        method_type,
    })
}

fn read_string(body: &mut &[u8], field: &str) -> Result<String, DecodeError> {
    if body.remaining() < LENGTH_SIZE {
        return Err(DecodeError::malformed(format!(
            "{field} length runs past end of body"
        )));
    }
    let len = body.get_u32_le() as usize;
    if body.remaining() < len {
        return Err(DecodeError::malformed(format!(
            "{field} of {len} bytes runs past end of body"
        )));
    }

    let current: &[u8] = body;
    let (raw, rest) = current.split_at(len);
    let value = std::str::from_utf8(raw)
        .map_err(|e| DecodeError::malformed(format!("{field} is not valid utf-8: {e}")))?
        .to_owned();
    *body = rest;
    Ok(value)
}
