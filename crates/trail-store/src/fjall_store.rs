//! Persistent snapshot storage backed by Fjall.
//!
//! Two keyspaces:
//!
//! - `versions` — `owner ++ created_at ++ id` → postcard-encoded [`Version`].
//!   Keys sort in history order, so an owner's versions are one prefix scan
//!   and the latest version before an instant is one reverse range step.
//! - `meta` — `next_id` → next [`VersionId`] (8 bytes BE), so the insertion
//!   sequence survives a reopen.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use tempfile::TempDir;
use trail_types::{NewVersion, OwnerRef, Version, VersionId};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::SnapshotStore;

type Result<T> = std::result::Result<T, StoreError>;

const NEXT_ID_KEY: &[u8] = b"next_id";

/// Snapshot store persisted in Fjall keyspaces.
pub struct FjallStore {
    /// The underlying Fjall database handle.
    #[allow(dead_code)]
    db: Database,
    versions: Keyspace,
    meta: Keyspace,
    /// Serializes appends so ids are handed out and persisted in order.
    next_id: Mutex<u64>,
    /// Keeps the directory of a temporary store alive. Dropped last.
    _tmp: Option<TempDir>,
}

impl FjallStore {
    /// Open a persistent store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path).open()?;
        Self::init_keyspaces(db, None)
    }

    /// Open a temporary store that is removed on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init_keyspaces(db, Some(tmp))
    }

    fn init_keyspaces(db: Database, tmp: Option<TempDir>) -> Result<Self> {
        let versions = db.keyspace("versions", KeyspaceCreateOptions::default)?;
        let meta = db.keyspace("meta", KeyspaceCreateOptions::default)?;

        let next_id = match meta.get(NEXT_ID_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes[..].try_into().map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "malformed next_id")
                })?;
                u64::from_be_bytes(arr)
            }
            None => 1,
        };

        Ok(Self {
            db,
            versions,
            meta,
            next_id: Mutex::new(next_id),
            _tmp: tmp,
        })
    }

    /// Take the next id and persist the advanced sequence before the id is
    /// used. A failure or crash after this point leaves a gap, never a
    /// reused id.
    fn reserve_id(&self, next_id: &mut u64) -> Result<VersionId> {
        let id = VersionId(*next_id);
        *next_id += 1;
        self.meta.insert(NEXT_ID_KEY, next_id.to_be_bytes())?;
        Ok(id)
    }
}

impl SnapshotStore for FjallStore {
    fn append(&self, version: NewVersion) -> Result<Version> {
        let mut next_id = self.next_id.lock()?;
        let id = self.reserve_id(&mut next_id)?;
        let version = version.with_id(id);

        let key = version_key(&version.owner, version.created_at, id);
        let value = postcard::to_allocvec(&version)?;
        self.versions.insert(key, value)?;

        debug!(owner = %version.owner, %id, event = %version.event, "stored version");
        Ok(version)
    }

    fn list_for(&self, owner: &OwnerRef) -> Result<Vec<Version>> {
        let mut history = Vec::new();
        for guard in self.versions.prefix(owner_prefix(owner)) {
            let (_, value) = guard.into_inner()?;
            history.push(postcard::from_bytes(&value)?);
        }
        Ok(history)
    }

    fn most_recent_before(&self, owner: &OwnerRef, at: DateTime<Utc>) -> Result<Option<Version>> {
        // Ids start at 1, so the id-0 key at `at` sorts before every version
        // created at `at` and after every earlier one.
        let upper = version_key(owner, at, VersionId(0));
        match self.versions.range(owner_prefix(owner)..upper).next_back() {
            Some(guard) => {
                let (_, value) = guard.into_inner()?;
                Ok(Some(postcard::from_bytes(&value)?))
            }
            None => Ok(None),
        }
    }

    fn owners(&self) -> Result<Vec<OwnerRef>> {
        let mut owners = BTreeSet::new();
        for guard in self.versions.iter() {
            let (_, value) = guard.into_inner()?;
            let version: Version = postcard::from_bytes(&value)?;
            owners.insert(version.owner);
        }
        Ok(owners.into_iter().collect())
    }
}

/// Length-prefixed `item_type ++ item_id`. No owner's prefix is a prefix of
/// another owner's keys.
fn owner_prefix(owner: &OwnerRef) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + owner.item_type.len() + owner.item_id.len() + 20);
    for part in [&owner.item_type, &owner.item_id] {
        key.extend_from_slice(&(part.len() as u32).to_be_bytes());
        key.extend_from_slice(part.as_bytes());
    }
    key
}

fn version_key(owner: &OwnerRef, created_at: DateTime<Utc>, id: VersionId) -> Vec<u8> {
    let mut key = owner_prefix(owner);
    key.extend_from_slice(&timestamp_key(created_at));
    key.extend_from_slice(&id.0.to_be_bytes());
    key
}

/// Order-preserving encoding of a timestamp: seconds since the epoch with
/// the sign bit flipped, then the sub-second nanoseconds, big-endian.
///
/// Covers the whole `DateTime<Utc>` range.
fn timestamp_key(at: DateTime<Utc>) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&((at.timestamp() as u64) ^ (1 << 63)).to_be_bytes());
    key[8..].copy_from_slice(&at.timestamp_subsec_nanos().to_be_bytes());
    key
}
