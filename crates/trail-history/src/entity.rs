//! The host-side view of a versioned entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trail_types::{AttributeMap, OwnerRef};

/// An entity whose history is recorded.
///
/// The host owns the entity and its persistence; the history engine only
/// reads these three things from it.
pub trait Versioned {
    /// Stable identity of this entity instance.
    fn owner(&self) -> OwnerRef;

    /// The current, live attribute mapping.
    fn attributes(&self) -> AttributeMap;

    /// When the live state was last modified.
    fn last_modified(&self) -> DateTime<Utc>;
}

/// A plain entity: an owner, a mapping and a modification time.
///
/// Handy for hosts that already keep attributes as a map, and for replaying
/// state from outside the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEntity {
    pub owner: OwnerRef,
    pub attributes: AttributeMap,
    pub last_modified: DateTime<Utc>,
}

impl LiveEntity {
    pub fn new(owner: OwnerRef, attributes: AttributeMap, last_modified: DateTime<Utc>) -> Self {
        Self {
            owner,
            attributes,
            last_modified,
        }
    }

    /// Replace the live attributes, as a host would after persisting an update.
    pub fn apply(&mut self, attributes: AttributeMap, at: DateTime<Utc>) {
        self.attributes = attributes;
        self.last_modified = at;
    }
}

impl Versioned for LiveEntity {
    fn owner(&self) -> OwnerRef {
        self.owner.clone()
    }

    fn attributes(&self) -> AttributeMap {
        self.attributes.clone()
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}
