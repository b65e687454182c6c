//! In-memory snapshot storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use trail_types::{NewVersion, OwnerRef, Version, VersionId};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::SnapshotStore;

/// In-memory snapshot store backed by a `RwLock<HashMap>`.
///
/// Each owner's versions are kept sorted by `(created_at, id)`, so reads are
/// a clone (or a binary search) of one vector. Useful for tests and for hosts
/// that only need history for the lifetime of the process.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    by_owner: HashMap<OwnerRef, Vec<Version>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                by_owner: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Total number of stored versions across all owners.
    pub fn len(&self) -> Result<usize, StoreError> {
        let inner = self.inner.read()?;
        Ok(inner.by_owner.values().map(Vec::len).sum())
    }

    /// Whether no version has been stored yet.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for MemoryStore {
    fn append(&self, version: NewVersion) -> Result<Version, StoreError> {
        let mut inner = self.inner.write()?;
        let id = VersionId(inner.next_id);
        inner.next_id += 1;

        let version = version.with_id(id);
        let history = inner.by_owner.entry(version.owner.clone()).or_default();

        // Ids only grow, so a skewed (earlier) timestamp lands before any
        // later-stamped versions and a tie lands after its equals.
        let key = version.sort_key();
        let pos = history.partition_point(|v| v.sort_key() <= key);
        history.insert(pos, version.clone());

        debug!(owner = %version.owner, id = %id, event = %version.event, "stored version in memory");
        Ok(version)
    }

    fn list_for(&self, owner: &OwnerRef) -> Result<Vec<Version>, StoreError> {
        let inner = self.inner.read()?;
        Ok(inner.by_owner.get(owner).cloned().unwrap_or_default())
    }

    fn most_recent_before(
        &self,
        owner: &OwnerRef,
        at: DateTime<Utc>,
    ) -> Result<Option<Version>, StoreError> {
        let inner = self.inner.read()?;
        let Some(history) = inner.by_owner.get(owner) else {
            return Ok(None);
        };
        let idx = history.partition_point(|v| v.created_at < at);
        Ok(idx.checked_sub(1).map(|i| history[i].clone()))
    }

    fn owners(&self) -> Result<Vec<OwnerRef>, StoreError> {
        let inner = self.inner.read()?;
        let mut owners: Vec<OwnerRef> = inner.by_owner.keys().cloned().collect();
        owners.sort();
        Ok(owners)
    }
}
