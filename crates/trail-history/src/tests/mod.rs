//! Tests for the history engine.


use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use trail_store::MemoryStore;
use trail_types::{AttributeMap, ManualClock, OwnerRef};

use crate::{ActorProvider, History, LiveEntity, Recorder};

/// Seconds after a fixed epoch, so tests read as a timeline.
fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
}

/// A recorder and a history sharing one in-memory store and a manual clock.
struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    recorder: Recorder,
    history: History,
}

impl Harness {
    fn new() -> Self {
        Self::with_actor(Arc::new(crate::NoActor))
    }

    fn with_actor(actor: Arc<dyn ActorProvider>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(t(0)));
        let recorder = Recorder::new(store.clone())
            .with_clock(clock.clone())
            .with_actor(actor);
        let history = History::new(store.clone());
        Self {
            store,
            clock,
            recorder,
            history,
        }
    }

    /// Create an entity at `secs` and record it.
    fn create(&self, id: &str, attributes: AttributeMap, secs: i64) -> LiveEntity {
        self.clock.set(t(secs));
        let entity = LiveEntity::new(OwnerRef::new("Widget", id), attributes, t(secs));
        self.recorder.record_create(&entity).unwrap();
        entity
    }

    /// Update an entity at `secs`, recording before applying, as a host would.
    fn update(&self, entity: &mut LiveEntity, next: AttributeMap, secs: i64) {
        self.clock.set(t(secs));
        self.recorder.record_update(&*entity, &next).unwrap();
        entity.apply(next, t(secs));
    }

    /// Destroy an entity at `secs`. The live value keeps its last state.
    fn destroy(&self, entity: &LiveEntity, secs: i64) {
        self.clock.set(t(secs));
        self.recorder.record_destroy(entity).unwrap();
    }
}
