//! Snapshot storage trait and backend implementations.
//!
//! This crate defines the [`SnapshotStore`] trait for persisting immutable
//! [`Version`](trail_types::Version) records, along with three backends:
//!
//! - [`MemoryStore`] — in-memory storage backed by a `RwLock<HashMap>`.
//! - [`FjallStore`] — persistent storage in Fjall keyspaces, ordered on disk
//!   by `(owner, created_at, id)`.
//! - [`FlakyStore`] — wrapper that injects seeded, reproducible failures.

mod error;
mod fjall_store;
mod flaky_store;
mod memory_store;
mod traits;

pub use error::StoreError;
pub use fjall_store::FjallStore;
pub use flaky_store::FlakyStore;
pub use memory_store::MemoryStore;
pub use traits::SnapshotStore;
