//! End-to-end capture then analysis over the default demonstration workload.

use framelog::{
    Analysis, FramelogConfig, LogRecord, OrderedIndex, RecordKey, StorageError, boundary_keys,
    capture_demo, demo_records, demo_signature,
};
use framelog_storage::{LogReader, SnapshotStore};
use tempfile::TempDir;

fn config(dir: &TempDir) -> FramelogConfig {
    FramelogConfig::new(
        dir.path().join("saucisse.data"),
        dir.path().join("saucisse.index"),
    )
}

#[test]
fn default_workload_roundtrips_through_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);

    let summary = capture_demo(&config).unwrap();
    assert_eq!(summary.entries, 10_002);

    let mut analysis = Analysis::open(&config).unwrap();

    assert_eq!(
        analysis.lookup(RecordKey::new(5000)).unwrap(),
        LogRecord::I64Change {
            old: 4998,
            new: 4999
        }
    );
    assert_eq!(
        analysis.lookup(RecordKey::new(1)).unwrap(),
        LogRecord::BeginFrame(demo_signature())
    );
    assert_eq!(
        analysis.lookup(RecordKey::new(10_002)).unwrap(),
        LogRecord::EndFrame(demo_signature())
    );

    for key in [0, 10_003] {
        let err = analysis.lookup(RecordKey::new(key)).unwrap_err();
        assert!(matches!(err, StorageError::KeyNotFound(k) if k == RecordKey::new(key)));
    }
}

#[test]
fn every_key_reads_back_its_record() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir).with_record_count(2_000);

    capture_demo(&config).unwrap();
    let mut analysis = Analysis::open(&config).unwrap();

    for (key, expected) in demo_records(&config).unwrap() {
        assert_eq!(analysis.lookup(key).unwrap(), expected, "key {key}");
    }

    let probes = boundary_keys(analysis.index());
    assert_eq!(probes, vec![RecordKey::new(0), RecordKey::new(2_003)]);
    let reports = analysis.report(probes).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.record().is_none()));
}

#[test]
fn reloaded_index_matches_built_index() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir).with_record_count(500);

    capture_demo(&config).unwrap();

    // Rebuild the expected index from a sequential scan of the log
    let reader = LogReader::open(&config.data_path).unwrap();
    let expected: OrderedIndex = demo_records(&config)
        .unwrap()
        .into_iter()
        .zip(reader.scan().unwrap())
        .map(|((key, record), scanned)| {
            let (offset, scanned_record) = scanned.unwrap();
            assert_eq!(scanned_record, record);
            framelog::IndexEntry::new(key, offset)
        })
        .collect();

    let loaded = SnapshotStore::new(&config.index_path).load().unwrap();
    assert!(loaded.ascend().eq(expected.ascend()));
}

#[test]
fn recapture_replaces_previous_files() {
    let dir = TempDir::new().unwrap();

    capture_demo(&config(&dir).with_record_count(100)).unwrap();
    let config = config(&dir).with_record_count(10);
    capture_demo(&config).unwrap();

    let mut analysis = Analysis::open(&config).unwrap();
    assert_eq!(analysis.index().len(), 12);
    assert!(matches!(
        analysis.lookup(RecordKey::new(50)),
        Err(StorageError::KeyNotFound(_))
    ));
    assert_eq!(
        analysis.lookup(RecordKey::new(12)).unwrap(),
        LogRecord::EndFrame(demo_signature())
    );
}
