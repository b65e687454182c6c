//! Storage failures reach the caller untouched.

use std::sync::Arc;

use trail_history::{AuditOptions, History, HistoryError, LiveEntity, Recorder};
use trail_integration_tests::t;
use trail_store::{FlakyStore, MemoryStore, SnapshotStore, StoreError};
use trail_types::{OwnerRef, attributes};

fn post() -> LiveEntity {
    LiveEntity::new(OwnerRef::new("Post", "1"), attributes! { "n" => 0 }, t(0))
}

#[test]
fn test_failed_writes_surface_and_leave_no_version() {
    let inner = Arc::new(MemoryStore::new());
    let flaky: Arc<dyn SnapshotStore> =
        Arc::new(FlakyStore::new(inner.clone()).write_failure_rate(1.0));
    let recorder = Recorder::new(flaky);

    let err = recorder.record_create(&post()).unwrap_err();
    assert!(matches!(err, HistoryError::Store(StoreError::Unavailable(_))));
    assert!(inner.is_empty().unwrap());
}

#[test]
fn test_failed_reads_fail_the_trail() {
    let inner = Arc::new(MemoryStore::new());
    Recorder::new(inner.clone()).record_create(&post()).unwrap();

    let flaky: Arc<dyn SnapshotStore> =
        Arc::new(FlakyStore::new(inner).read_failure_rate(1.0));
    let history = History::new(flaky);

    let err = history
        .audit_trail(&post(), &AuditOptions::default())
        .unwrap_err();
    assert!(matches!(err, HistoryError::Store(StoreError::Unavailable(_))));

    // A query the live state answers never reaches the store.
    let state = history.state_at(&post(), t(5)).unwrap();
    assert_eq!(state.attributes, attributes! { "n" => 0 });
}

#[test]
fn test_partial_write_failures_keep_history_consistent() {
    let inner = Arc::new(MemoryStore::new());
    let flaky: Arc<dyn SnapshotStore> = Arc::new(
        FlakyStore::new(inner.clone())
            .write_failure_rate(0.3)
            .seed(7),
    );
    let recorder = Recorder::new(flaky);

    let mut entity = post();
    let mut stored = 0;
    for i in 1..=50i64 {
        let next = attributes! { "n" => i };
        if recorder.record_update(&entity, &next).is_ok() {
            stored += 1;
        }
        entity.apply(next, t(i));
    }
    assert!(stored > 0 && stored < 50);

    let versions = inner.list_for(&entity.owner).unwrap();
    assert_eq!(versions.len(), stored);
    assert!(versions.windows(2).all(|w| w[0].sort_key() < w[1].sort_key()));

    // Every stored snapshot decodes; the trail has one entry per version.
    let trail = History::new(inner)
        .audit_trail(&entity, &AuditOptions::ignoring_nothing())
        .unwrap();
    assert_eq!(trail.len(), stored);
    assert!(trail.iter().all(|e| !e.changes.is_empty()));
}
