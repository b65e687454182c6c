//! Many threads recording into one shared store.

use std::sync::Arc;
use std::thread;

use trail_history::{AuditOptions, History, LiveEntity, Recorder};
use trail_integration_tests::{all_stores, t};
use trail_types::{Event, OwnerRef, attributes};

const THREADS: usize = 8;
const UPDATES: i64 = 25;

#[test]
fn test_parallel_entities_keep_their_own_history() {
    for (name, store) in all_stores() {
        let recorder = Arc::new(Recorder::new(store.clone()));

        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let recorder = recorder.clone();
                thread::spawn(move || {
                    let owner = OwnerRef::new("Counter", n.to_string());
                    let mut entity = LiveEntity::new(owner, attributes! { "n" => 0 }, t(0));
                    recorder.record_create(&entity).unwrap();
                    for i in 1..=UPDATES {
                        let next = attributes! { "n" => i };
                        recorder.record_update(&entity, &next).unwrap();
                        entity.apply(next, t(i));
                    }
                    entity
                })
            })
            .collect();
        let entities: Vec<LiveEntity> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let history = History::new(store.clone());
        for entity in &entities {
            let versions = store.list_for(&entity.owner).unwrap();
            assert_eq!(versions.len(), UPDATES as usize + 1, "store: {name}");
            assert_eq!(versions[0].event, Event::Create);
            assert!(versions.windows(2).all(|w| w[0].sort_key() < w[1].sort_key()));

            let trail = history
                .audit_trail(entity, &AuditOptions::default())
                .unwrap();
            assert_eq!(trail.len(), UPDATES as usize + 1);
            assert_eq!(trail[0].changes[0].after, Some(UPDATES.into()));
        }
        assert_eq!(store.owners().unwrap().len(), THREADS);
    }
}

#[test]
fn test_parallel_writers_on_one_entity_get_distinct_ids() {
    for (name, store) in all_stores() {
        let recorder = Arc::new(Recorder::new(store.clone()));
        let owner = OwnerRef::new("Shared", "1");

        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let recorder = recorder.clone();
                let owner = owner.clone();
                thread::spawn(move || {
                    let entity = LiveEntity::new(owner, attributes! { "writer" => n as i64 }, t(0));
                    for i in 0..UPDATES {
                        recorder
                            .record_update(&entity, &attributes! { "step" => i })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let versions = store.list_for(&owner).unwrap();
        assert_eq!(versions.len(), THREADS * UPDATES as usize, "store: {name}");
        let mut ids: Vec<u64> = versions.iter().map(|v| v.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), versions.len());
    }
}
