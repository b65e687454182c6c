//! The process-wide versioning switch.

use std::sync::Arc;

use trail_history::{AuditOptions, History, LiveEntity, Recorder, is_enabled, set_enabled};
use trail_integration_tests::t;
use trail_store::{MemoryStore, SnapshotStore};
use trail_types::{OwnerRef, attributes};

#[test]
fn test_switch_stops_recording_but_not_reading() {
    let store = Arc::new(MemoryStore::new());
    let recorder = Recorder::new(store.clone());
    let history = History::new(store.clone());

    assert!(is_enabled());
    let mut entity = LiveEntity::new(OwnerRef::new("Post", "1"), attributes! { "n" => 0 }, t(0));
    assert!(recorder.record_create(&entity).unwrap().is_some());

    set_enabled(false);
    assert!(!is_enabled());
    let next = attributes! { "n" => 1 };
    assert!(recorder.record_update(&entity, &next).unwrap().is_none());
    entity.apply(next, t(10));
    assert!(recorder.record_destroy(&entity).unwrap().is_none());
    assert_eq!(store.list_for(&entity.owner).unwrap().len(), 1);

    // Reads keep working while recording is off.
    let trail = history
        .audit_trail(&entity, &AuditOptions::default())
        .unwrap();
    assert_eq!(trail.len(), 1);

    set_enabled(true);
    assert!(
        recorder
            .record_update(&entity, &attributes! { "n" => 2 })
            .unwrap()
            .is_some()
    );
    assert_eq!(store.list_for(&entity.owner).unwrap().len(), 2);
}
