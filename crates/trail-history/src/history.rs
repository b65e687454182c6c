//! Point-in-time reconstruction and audit trails.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trail_store::SnapshotStore;
use trail_types::{AttributeMap, Event, JsonCodec, OwnerRef, SnapshotCodec, Version, VersionId};
use tracing::{debug, warn};

use crate::config::TrailConfig;
use crate::diff::{Change, DEFAULT_IGNORED_ATTRIBUTES, differences_ignoring};
use crate::entity::Versioned;
use crate::error::HistoryError;

type Result<T> = std::result::Result<T, HistoryError>;

type ActorDisplay = dyn Fn(Option<&str>) -> Option<String> + Send + Sync;

/// Options for [`History::audit_trail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOptions {
    /// Attributes dropped from both sides of every diff.
    pub attributes_to_ignore: BTreeSet<String>,
}

impl AuditOptions {
    /// Ignore exactly the given attributes.
    pub fn ignoring<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes_to_ignore: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Report every attribute, `updated_at` included.
    pub fn ignoring_nothing() -> Self {
        Self {
            attributes_to_ignore: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &TrailConfig) -> Self {
        Self::ignoring(config.ignore_attributes.iter().cloned())
    }
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self::ignoring(DEFAULT_IGNORED_ATTRIBUTES.iter().copied())
    }
}

/// One transition in an entity's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailEntry {
    /// The event that moved the entity out of the older state.
    pub event: Event,
    /// Who performed it, after the display transform.
    pub changed_by: Option<String>,
    /// When it happened.
    pub changed_at: DateTime<Utc>,
    /// What changed, sorted by attribute name.
    pub changes: Vec<Change>,
}

/// Where a reconstructed state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSource {
    /// The live entity already satisfied the query.
    Live,
    /// Decoded from a stored version.
    Version {
        id: VersionId,
        created_at: DateTime<Utc>,
    },
}

/// An entity's attributes as of some instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructedState {
    pub owner: OwnerRef,
    pub attributes: AttributeMap,
    pub source: StateSource,
}

/// A point in history delimiting one transition: a stored version, or the
/// live state appended as a synthetic `update`.
struct Boundary {
    event: Event,
    whodunnit: Option<String>,
    created_at: DateTime<Utc>,
    attributes: AttributeMap,
}

/// Reads an entity's stored versions back into history.
pub struct History {
    store: Arc<dyn SnapshotStore>,
    codec: Arc<dyn SnapshotCodec>,
    actor_display: Option<Box<ActorDisplay>>,
}

impl History {
    /// History over `store`, decoding snapshots as JSON.
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            codec: Arc::new(JsonCodec),
            actor_display: None,
        }
    }

    /// Decode snapshots with `codec` instead of JSON.
    pub fn with_codec(mut self, codec: Arc<dyn SnapshotCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Transform stored actor ids before they reach
    /// [`TrailEntry::changed_by`], e.g. to turn a user id into a name.
    pub fn with_actor_display<F>(mut self, display: F) -> Self
    where
        F: Fn(Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        self.actor_display = Some(Box::new(display));
        self
    }

    /// All stored versions of `entity`, oldest first.
    pub fn versions<E: Versioned + ?Sized>(&self, entity: &E) -> Result<Vec<Version>> {
        Ok(self.store.list_for(&entity.owner())?)
    }

    /// The entity's attributes as they were at `at`.
    ///
    /// If the entity has not changed since before `at`, the live state is
    /// returned without touching the store. Otherwise the latest version
    /// created strictly before `at` is decoded. Its snapshot is the state
    /// that was live up to that version's own event, so a `create` found
    /// this way reconstructs to an empty mapping.
    ///
    /// Fails with [`HistoryError::NotFoundAtTimestamp`] when no version
    /// predates `at`.
    pub fn state_at<E: Versioned + ?Sized>(
        &self,
        entity: &E,
        at: DateTime<Utc>,
    ) -> Result<ReconstructedState> {
        let owner = entity.owner();

        if entity.last_modified() < at {
            return Ok(ReconstructedState {
                owner,
                attributes: entity.attributes(),
                source: StateSource::Live,
            });
        }

        let Some(version) = self.store.most_recent_before(&owner, at)? else {
            return Err(HistoryError::NotFoundAtTimestamp { owner, at });
        };

        debug!(%owner, id = %version.id, %at, "reconstructing from version");
        Ok(ReconstructedState {
            attributes: self.decode(&version),
            source: StateSource::Version {
                id: version.id,
                created_at: version.created_at,
            },
            owner,
        })
    }

    /// Every transition of `entity`, newest first.
    ///
    /// The stored versions plus the live state form the boundaries of the
    /// history; each adjacent pair yields one entry labelled with the
    /// *older* boundary's event, actor and timestamp. An entity with no
    /// stored versions has an empty trail.
    pub fn audit_trail<E: Versioned + ?Sized>(
        &self,
        entity: &E,
        options: &AuditOptions,
    ) -> Result<Vec<TrailEntry>> {
        let owner = entity.owner();
        let versions = self.store.list_for(&owner)?;
        if versions.is_empty() {
            return Ok(Vec::new());
        }

        let mut boundaries: Vec<Boundary> = versions
            .iter()
            .map(|version| Boundary {
                event: version.event,
                whodunnit: version.whodunnit.clone(),
                created_at: version.created_at,
                attributes: self.decode(version),
            })
            .collect();
        boundaries.push(Boundary {
            event: Event::Update,
            whodunnit: None,
            created_at: entity.last_modified(),
            attributes: entity.attributes(),
        });
        boundaries.reverse();

        let trail: Vec<TrailEntry> = boundaries
            .windows(2)
            .map(|pair| {
                let (newer, older) = (&pair[0], &pair[1]);
                TrailEntry {
                    event: older.event,
                    changed_by: self.display_actor(older.whodunnit.as_deref()),
                    changed_at: older.created_at,
                    changes: differences_ignoring(
                        &older.attributes,
                        &newer.attributes,
                        &options.attributes_to_ignore,
                    ),
                }
            })
            .collect();

        debug!(%owner, entries = trail.len(), "built audit trail");
        Ok(trail)
    }

    fn display_actor(&self, whodunnit: Option<&str>) -> Option<String> {
        match &self.actor_display {
            Some(display) => display(whodunnit),
            None => whodunnit.map(str::to_string),
        }
    }

    /// Decode a version's snapshot. A create has no prior state; an absent
    /// or unreadable payload degrades to an empty mapping for this version
    /// only.
    fn decode(&self, version: &Version) -> AttributeMap {
        match (&version.object, version.event) {
            (None, Event::Create) => AttributeMap::new(),
            (None, event) => {
                warn!(owner = %version.owner, id = %version.id, %event, "version has no snapshot");
                AttributeMap::new()
            }
            (Some(payload), _) => self.codec.decode(payload).unwrap_or_else(|e| {
                warn!(owner = %version.owner, id = %version.id, error = %e, "corrupt snapshot");
                AttributeMap::new()
            }),
        }
    }
}
