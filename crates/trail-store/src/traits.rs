//! Core trait for snapshot storage.

use chrono::{DateTime, Utc};
use trail_types::{NewVersion, OwnerRef, Version};

use crate::error::StoreError;

/// Append-only store of [`Version`] records keyed by owner.
///
/// All implementations must be `Send + Sync`: independent entities may
/// append concurrently. Versions of one owner are always returned in
/// `(created_at asc, id asc)` order, so insertion order survives equal or
/// skewed timestamps.
pub trait SnapshotStore: Send + Sync {
    /// Append a version, assigning it the next [`VersionId`](trail_types::VersionId).
    ///
    /// The returned record is visible to every subsequent read.
    fn append(&self, version: NewVersion) -> Result<Version, StoreError>;

    /// All versions of `owner`, oldest first. Empty if it has no history.
    fn list_for(&self, owner: &OwnerRef) -> Result<Vec<Version>, StoreError>;

    /// The latest version of `owner` created strictly before `at`.
    fn most_recent_before(
        &self,
        owner: &OwnerRef,
        at: DateTime<Utc>,
    ) -> Result<Option<Version>, StoreError>;

    /// Every owner with at least one version, sorted.
    fn owners(&self) -> Result<Vec<OwnerRef>, StoreError>;
}
