//! Lifecycle recording: the three hooks a host calls around mutations.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use trail_store::SnapshotStore;
use trail_types::{
    AttributeMap, Clock, Event, JsonCodec, MonotonicClock, NewVersion, OwnerRef, SnapshotCodec,
    Version,
};
use tracing::debug;

use crate::actor::{ActorProvider, NoActor};
use crate::config::TrailConfig;
use crate::entity::Versioned;
use crate::error::HistoryError;
use crate::switch;

type Result<T> = std::result::Result<T, HistoryError>;

/// Appends versions to a [`SnapshotStore`] at an entity's lifecycle points.
///
/// The host calls:
/// - [`record_create`](Self::record_create) after the entity is created,
/// - [`record_update`](Self::record_update) before an update is applied,
/// - [`record_destroy`](Self::record_destroy) after the entity is destroyed.
///
/// Each returns `Ok(None)` when nothing was recorded: versioning is off
/// process-wide or for the entity's type, or an update changes nothing.
pub struct Recorder {
    store: Arc<dyn SnapshotStore>,
    codec: Arc<dyn SnapshotCodec>,
    actor: Arc<dyn ActorProvider>,
    clock: Arc<dyn Clock>,
    disabled_types: RwLock<HashSet<String>>,
}

impl Recorder {
    /// Recorder over `store` with JSON snapshots, no actor attribution and a
    /// monotonic wall clock.
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            codec: Arc::new(JsonCodec),
            actor: Arc::new(NoActor),
            clock: Arc::new(MonotonicClock::new()),
            disabled_types: RwLock::new(HashSet::new()),
        }
    }

    /// Recorder with the per-type switches from `config`.
    ///
    /// The process-wide switch is not touched; apply `config.enabled` with
    /// [`set_enabled`](crate::set_enabled).
    pub fn from_config(store: Arc<dyn SnapshotStore>, config: &TrailConfig) -> Self {
        let recorder = Self::new(store);
        for item_type in &config.disabled_types {
            recorder.disable_type(item_type.clone());
        }
        recorder
    }

    pub fn with_codec(mut self, codec: Arc<dyn SnapshotCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Resolve `whodunnit` through `actor` on every recorded version.
    pub fn with_actor(mut self, actor: Arc<dyn ActorProvider>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Stop recording lifecycle events for `item_type`.
    pub fn disable_type(&self, item_type: impl Into<String>) {
        let item_type = item_type.into();
        debug!(%item_type, "versioning disabled for type");
        self.disabled_types
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(item_type);
    }

    /// Resume recording lifecycle events for `item_type`.
    pub fn enable_type(&self, item_type: &str) {
        debug!(item_type, "versioning enabled for type");
        self.disabled_types
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(item_type);
    }

    pub fn is_type_enabled(&self, item_type: &str) -> bool {
        !self
            .disabled_types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(item_type)
    }

    /// Whether a lifecycle event of `owner` would be recorded right now.
    pub fn is_active_for(&self, owner: &OwnerRef) -> bool {
        switch::is_enabled() && self.is_type_enabled(&owner.item_type)
    }

    /// Record that `entity` was just created. No snapshot is stored.
    pub fn record_create<E: Versioned + ?Sized>(&self, entity: &E) -> Result<Option<Version>> {
        let owner = entity.owner();
        if !self.is_active_for(&owner) {
            debug!(%owner, "create not recorded, versioning off");
            return Ok(None);
        }
        self.append(Event::Create, owner, None).map(Some)
    }

    /// Record that `entity` is about to change to `next`.
    ///
    /// `entity` must still hold its pre-update attributes; that state is
    /// what gets stored. Nothing is recorded when `next` equals it.
    pub fn record_update<E: Versioned + ?Sized>(
        &self,
        entity: &E,
        next: &AttributeMap,
    ) -> Result<Option<Version>> {
        let owner = entity.owner();
        if !self.is_active_for(&owner) {
            debug!(%owner, "update not recorded, versioning off");
            return Ok(None);
        }

        let current = entity.attributes();
        if &current == next {
            debug!(%owner, "update not recorded, nothing changed");
            return Ok(None);
        }

        let object = self.codec.encode(&current)?;
        self.append(Event::Update, owner, Some(object)).map(Some)
    }

    /// Record that `entity` was just destroyed, storing its final attributes.
    pub fn record_destroy<E: Versioned + ?Sized>(&self, entity: &E) -> Result<Option<Version>> {
        let owner = entity.owner();
        if !self.is_active_for(&owner) {
            debug!(%owner, "destroy not recorded, versioning off");
            return Ok(None);
        }

        let object = self.codec.encode(&entity.attributes())?;
        self.append(Event::Destroy, owner, Some(object)).map(Some)
    }

    fn append(&self, event: Event, owner: OwnerRef, object: Option<String>) -> Result<Version> {
        let version = self.store.append(NewVersion {
            event,
            owner,
            object,
            whodunnit: self.actor.whodunnit(),
            created_at: self.clock.now(),
        })?;
        debug!(
            owner = %version.owner,
            id = %version.id,
            %event,
            whodunnit = version.whodunnit.as_deref().unwrap_or("-"),
            "recorded version"
        );
        Ok(version)
    }
}
