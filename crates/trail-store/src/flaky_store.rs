//! A [`SnapshotStore`] wrapper that fails operations on purpose.
//!
//! `FlakyStore` wraps any `Arc<dyn SnapshotStore>` and rejects reads and
//! writes with a configurable probability. The RNG is seeded for
//! deterministic, reproducible behaviour across test runs.
//!
//! # Example
//!
//! ```ignore
//! let flaky = FlakyStore::new(inner)
//!     .write_failure_rate(0.25)
//!     .read_failure_rate(0.0)
//!     .seed(42);
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trail_types::{NewVersion, OwnerRef, Version};
use tracing::warn;

use crate::error::StoreError;
use crate::traits::SnapshotStore;

/// A [`SnapshotStore`] wrapper that injects failures before IO operations.
///
/// Useful to check that storage errors reach the caller untouched.
pub struct FlakyStore {
    inner: Arc<dyn SnapshotStore>,
    read_failure_rate: f64,
    write_failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl FlakyStore {
    /// Wrap an existing store with no failures (pass-through) by default.
    pub fn new(inner: Arc<dyn SnapshotStore>) -> Self {
        Self {
            inner,
            read_failure_rate: 0.0,
            write_failure_rate: 0.0,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Probability in `[0, 1]` that a read fails.
    pub fn read_failure_rate(mut self, rate: f64) -> Self {
        self.read_failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Probability in `[0, 1]` that a write fails.
    pub fn write_failure_rate(mut self, rate: f64) -> Self {
        self.write_failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set the RNG seed for deterministic behaviour.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn roll(&self, rate: f64, op: &'static str) -> Result<(), StoreError> {
        if rate <= 0.0 {
            return Ok(());
        }
        let fail = rate >= 1.0 || self.rng.lock()?.random_bool(rate);
        if fail {
            warn!(op, "injected store failure");
            return Err(StoreError::Unavailable(format!("injected failure on {op}")));
        }
        Ok(())
    }
}

impl SnapshotStore for FlakyStore {
    fn append(&self, version: NewVersion) -> Result<Version, StoreError> {
        self.roll(self.write_failure_rate, "append")?;
        self.inner.append(version)
    }

    fn list_for(&self, owner: &OwnerRef) -> Result<Vec<Version>, StoreError> {
        self.roll(self.read_failure_rate, "list_for")?;
        self.inner.list_for(owner)
    }

    fn most_recent_before(
        &self,
        owner: &OwnerRef,
        at: DateTime<Utc>,
    ) -> Result<Option<Version>, StoreError> {
        self.roll(self.read_failure_rate, "most_recent_before")?;
        self.inner.most_recent_before(owner, at)
    }

    fn owners(&self) -> Result<Vec<OwnerRef>, StoreError> {
        self.roll(self.read_failure_rate, "owners")?;
        self.inner.owners()
    }
}
