//! Version history engine.
//!
//! Given the append-only [`SnapshotStore`](trail_store::SnapshotStore), this
//! crate provides the three pieces that turn stored snapshots into history:
//!
//! - [`diff`] — attribute-level differences between two mappings.
//! - [`History`] — reconstructs an entity as of a past instant
//!   ([`History::state_at`]) and walks its versions into an audit trail
//!   ([`History::audit_trail`]).
//! - [`Recorder`] — the explicit lifecycle hooks a host calls on create,
//!   before update and after destroy.
//!
//! A version stores the state *before* its event. The live entity is the
//! newest state and is never stored until it is mutated again.

mod actor;
mod config;
pub mod diff;
mod entity;
mod error;
mod history;
mod recorder;
mod switch;

#[cfg(test)]
mod tests;

pub use actor::{ActorProvider, FixedActor, NoActor};
pub use config::TrailConfig;
pub use diff::{Change, DEFAULT_IGNORED_ATTRIBUTES, differences, differences_ignoring};
pub use entity::{LiveEntity, Versioned};
pub use error::HistoryError;
pub use history::{AuditOptions, History, ReconstructedState, StateSource, TrailEntry};
pub use recorder::Recorder;
pub use switch::{is_enabled, set_enabled};
