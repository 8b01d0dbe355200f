//! Unit tests for framelog

use std::io::{Seek, SeekFrom, Write};

use tempfile::TempDir;

use crate::{
    Analysis, Capture, DecodeError, FramelogConfig, FramelogError, IndexEntry, KeyReport,
    LogRecord, Offset, OrderedIndex, RecordKey, StorageError, boundary_keys, capture_demo,
    demo_records, demo_signature,
};

fn setup(record_count: u32) -> (FramelogConfig, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = FramelogConfig::new(dir.path().join("test.data"), dir.path().join("test.index"))
        .with_record_count(record_count);
    (config, dir)
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn default_config_matches_demo_layout() {
    let config = FramelogConfig::default();
    assert_eq!(config.record_count, 10_000);
    assert_eq!(config.first_key(), RecordKey::new(1));
    assert_eq!(config.last_key().unwrap(), RecordKey::new(10_002));
    assert_eq!(config.sample_count, 20);
    assert!(config.validate().is_ok());
}

#[test]
fn config_rejects_key_overflow() {
    let config = FramelogConfig::default()
        .with_first_key(i32::MAX - 5)
        .with_record_count(10);
    assert!(matches!(config.validate(), Err(FramelogError::Config(_))));
}

#[test]
fn config_rejects_shared_path() {
    let config = FramelogConfig::new("same.file", "same.file");
    assert!(matches!(config.validate(), Err(FramelogError::Config(_))));
}

#[test]
fn config_loads_partial_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("framelog.json");
    std::fs::write(
        &path,
        r#"{ "data_path": "a.data", "index_path": "a.index", "record_count": 50 }"#,
    )
    .unwrap();

    let config = FramelogConfig::load(&path).unwrap();
    assert_eq!(config.data_path, std::path::PathBuf::from("a.data"));
    assert_eq!(config.record_count, 50);
    assert_eq!(config.first_key, 1);
    assert_eq!(config.sample_count, 20);
}

#[test]
fn config_load_reports_missing_file_and_bad_json() {
    let dir = TempDir::new().unwrap();

    let missing = FramelogConfig::load(dir.path().join("missing.json"));
    assert!(matches!(missing, Err(FramelogError::ConfigIo { .. })));

    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    let bad = FramelogConfig::load(&path);
    assert!(matches!(bad, Err(FramelogError::ConfigParse(_))));
}

// ============================================================================
// Demo Workload Tests
// ============================================================================

#[test]
fn demo_records_follow_begin_changes_end() {
    let (config, _dir) = setup(3);
    let records: Vec<_> = demo_records(&config).unwrap().collect();

    let expected = vec![
        (RecordKey::new(1), LogRecord::BeginFrame(demo_signature())),
        (RecordKey::new(2), LogRecord::I64Change { old: 0, new: 1 }),
        (RecordKey::new(3), LogRecord::I64Change { old: 1, new: 2 }),
        (RecordKey::new(4), LogRecord::I64Change { old: 2, new: 3 }),
        (RecordKey::new(5), LogRecord::EndFrame(demo_signature())),
    ];
    assert_eq!(records, expected);
}

#[test]
fn demo_records_honor_first_key() {
    let (config, _dir) = setup(1);
    let config = config.with_first_key(-10);
    let keys: Vec<i32> = demo_records(&config)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k.as_i32())
        .collect();
    assert_eq!(keys, vec![-10, -9, -8]);
}

#[test]
fn demo_records_are_generated_lazily() {
    // Largest workload the key range allows; nothing is built up front.
    let config = FramelogConfig::default()
        .with_first_key(i32::MIN)
        .with_record_count(u32::MAX - 2);
    let mut records = demo_records(&config).unwrap();

    assert_eq!(records.size_hint().0, u32::MAX as usize);
    assert_eq!(
        records.next(),
        Some((RecordKey::new(i32::MIN), LogRecord::BeginFrame(demo_signature())))
    );
    assert_eq!(
        records.next(),
        Some((
            RecordKey::new(i32::MIN + 1),
            LogRecord::I64Change { old: 0, new: 1 }
        ))
    );
}

// ============================================================================
// Boundary Key Tests
// ============================================================================

#[test]
fn boundary_keys_sit_outside_indexed_range() {
    let index: OrderedIndex = [1, 5, 10_002]
        .into_iter()
        .map(|k| IndexEntry::new(RecordKey::new(k), Offset::ZERO))
        .collect();
    assert_eq!(
        boundary_keys(&index),
        vec![RecordKey::new(0), RecordKey::new(10_003)]
    );
}

#[test]
fn boundary_keys_skip_overflow() {
    let index: OrderedIndex = [i32::MIN, i32::MIN + 1]
        .into_iter()
        .map(|k| IndexEntry::new(RecordKey::new(k), Offset::ZERO))
        .collect();
    assert_eq!(boundary_keys(&index), vec![RecordKey::new(i32::MIN + 2)]);
}

#[test]
fn boundary_keys_of_empty_index_are_empty() {
    assert!(boundary_keys(&OrderedIndex::new()).is_empty());
}

#[test]
fn boundary_keys_follow_captured_range_not_config() {
    let (config, _dir) = setup(5);
    capture_demo(&config).unwrap();

    // Analysing with a different record count must not move the probes
    let mut analysis = Analysis::open(&config.clone().with_record_count(10_000)).unwrap();
    let probes = boundary_keys(analysis.index());
    assert_eq!(probes, vec![RecordKey::new(0), RecordKey::new(8)]);

    let reports = analysis.report(probes).unwrap();
    assert!(reports.iter().all(|r| matches!(
        r,
        KeyReport::Failed {
            error: StorageError::KeyNotFound(_),
            ..
        }
    )));
}

// ============================================================================
// Capture / Analysis Tests
// ============================================================================

#[test]
fn capture_summary_counts_entries() {
    let (config, _dir) = setup(25);
    let summary = capture_demo(&config).unwrap();

    assert_eq!(summary.entries, 27);
    assert_eq!(
        summary.key_range,
        Some((RecordKey::new(1), RecordKey::new(27)))
    );
    assert_eq!(summary.index_bytes, (16 + 27 * 12 + 4) as u64);
    assert_eq!(
        summary.log_bytes,
        std::fs::metadata(&config.data_path).unwrap().len()
    );
}

#[test]
fn capture_replaced_key_reads_latest_record() {
    let (config, _dir) = setup(0);
    let mut capture = Capture::create(&config).unwrap();

    let first = capture
        .append(RecordKey::new(7), &LogRecord::I64Change { old: 0, new: 1 })
        .unwrap();
    let second = capture
        .append(RecordKey::new(7), &LogRecord::I64Change { old: 1, new: 2 })
        .unwrap();
    assert!(second > first);
    assert_eq!(capture.index().len(), 1);
    capture.finish().unwrap();

    let mut analysis = Analysis::open(&config).unwrap();
    assert_eq!(
        analysis.lookup(RecordKey::new(7)).unwrap(),
        LogRecord::I64Change { old: 1, new: 2 }
    );
}

#[test]
fn abandoned_capture_leaves_no_snapshot() {
    let (config, _dir) = setup(5);
    capture_demo(&config).unwrap();
    assert!(config.index_path.exists());

    // A new build starts and is dropped before finishing
    {
        let mut capture = Capture::create(&config).unwrap();
        capture
            .append(RecordKey::new(1), &LogRecord::BeginFrame(demo_signature()))
            .unwrap();
    }

    assert!(!config.index_path.exists());
    assert!(matches!(
        Analysis::open(&config),
        Err(FramelogError::Storage(StorageError::Io(_)))
    ));
}

#[test]
fn analysis_without_capture_is_io_error() {
    let (config, _dir) = setup(5);
    assert!(matches!(
        Analysis::open(&config),
        Err(FramelogError::Storage(StorageError::Io(_)))
    ));
}

#[test]
fn report_continues_past_missing_keys() {
    let (config, _dir) = setup(10);
    capture_demo(&config).unwrap();

    let mut analysis = Analysis::open(&config).unwrap();
    let keys = [0, 1, 6, 99, 12].map(RecordKey::new);
    let reports = analysis.report(keys).unwrap();

    assert_eq!(reports.len(), 5);
    assert!(matches!(
        &reports[0],
        KeyReport::Failed { error: StorageError::KeyNotFound(k), .. } if *k == RecordKey::new(0)
    ));
    assert_eq!(
        reports[1].record(),
        Some(&LogRecord::BeginFrame(demo_signature()))
    );
    assert_eq!(
        reports[2].record(),
        Some(&LogRecord::I64Change { old: 4, new: 5 })
    );
    assert!(reports[3].record().is_none());
    assert_eq!(
        reports[4].record(),
        Some(&LogRecord::EndFrame(demo_signature()))
    );

    let keys: Vec<RecordKey> = reports.iter().map(KeyReport::key).collect();
    assert_eq!(keys, [0, 1, 6, 99, 12].map(RecordKey::new));
}

#[test]
fn report_continues_past_undecodable_record() {
    let (config, _dir) = setup(10);
    capture_demo(&config).unwrap();

    let mut analysis = Analysis::open(&config).unwrap();
    let corrupt = analysis.index().get(RecordKey::new(6)).unwrap();

    // Overwrite the tag byte of key 6's record in place
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .open(&config.data_path)
        .unwrap();
    file.seek(SeekFrom::Start(corrupt.as_u64().unwrap()))
        .unwrap();
    file.write_all(&[0xFF]).unwrap();
    file.sync_all().unwrap();

    let keys = [6, 7, 0].map(RecordKey::new);
    let reports = analysis.report(keys).unwrap();

    assert_eq!(reports.len(), 3);
    assert!(matches!(
        &reports[0],
        KeyReport::Failed {
            key,
            error: StorageError::Decode(DecodeError::UnknownType { tag: 0xFF }),
        } if *key == RecordKey::new(6)
    ));
    assert_eq!(
        reports[1].record(),
        Some(&LogRecord::I64Change { old: 5, new: 6 })
    );
    assert!(matches!(
        &reports[2],
        KeyReport::Failed {
            error: StorageError::KeyNotFound(_),
            ..
        }
    ));
}

#[test]
fn report_display_includes_offset() {
    let (config, _dir) = setup(2);
    capture_demo(&config).unwrap();

    let mut analysis = Analysis::open(&config).unwrap();
    let reports = analysis
        .report([RecordKey::new(1), RecordKey::new(9)])
        .unwrap();

    assert_eq!(
        reports[0].to_string(),
        "record 1, datafile offset 0: begin frame: FQN = java/lang/String.getBytes()[B"
    );
    assert_eq!(reports[1].to_string(), "record 9: key not found: 9");
}
