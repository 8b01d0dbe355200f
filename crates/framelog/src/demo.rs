//! Demonstration workload.
//!
//! Captures a single `java/lang/String.getBytes()[B` frame containing a run of
//! 64-bit value changes:
//!
//! ```text
//! first_key                    begin frame
//! first_key + 1 ..= + count    i64 change, old = n - 1, new = n
//! first_key + count + 1        end frame
//! ```
//!
//! where `n` counts the changes from 1.

use std::iter;

use framelog_types::{FrameSignature, LogRecord, RecordKey};

use crate::capture::{Capture, CaptureSummary};
use crate::config::FramelogConfig;
use crate::error::Result;

/// Signature of the frame the demonstration workload records.
pub fn demo_signature() -> FrameSignature {
    FrameSignature::new("java/lang/String", "getBytes", "()[B")
}

/// Returns the `(key, record)` sequence the demonstration capture writes.
///
/// Records are generated as the iterator advances.
pub fn demo_records(
    config: &FramelogConfig,
) -> Result<impl Iterator<Item = (RecordKey, LogRecord)> + use<>> {
    let first_key = config.first_key();
    let last_key = config.last_key()?;
    let first = i64::from(config.first_key);

    let changes = (1..=i64::from(config.record_count)).map(move |n| {
        // In range: last_key() checked first + count + 1
        let key = RecordKey::new((first + n) as i32);
        (key, LogRecord::I64Change { old: n - 1, new: n })
    });

    Ok(
        iter::once((first_key, LogRecord::BeginFrame(demo_signature())))
            .chain(changes)
            .chain(iter::once((last_key, LogRecord::EndFrame(demo_signature())))),
    )
}

/// Runs the demonstration capture against the configured file pair.
pub fn capture_demo(config: &FramelogConfig) -> Result<CaptureSummary> {
    let records = demo_records(config)?;
    let mut capture = Capture::create(config)?;
    for (key, record) in records {
        capture.append(key, &record)?;
    }
    capture.finish()
}
