//! Error types for the history engine.

use chrono::{DateTime, Utc};
use trail_types::OwnerRef;

/// Errors returned by [`History`](crate::History) and
/// [`Recorder`](crate::Recorder) operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The snapshot store failed. Never retried here.
    #[error("store error: {0}")]
    Store(#[from] trail_store::StoreError),

    /// The live attributes could not be encoded while recording.
    #[error("codec error: {0}")]
    Codec(#[from] trail_types::CodecError),

    /// The entity has no known state before the requested instant.
    #[error("no state for {owner} before {at}")]
    NotFoundAtTimestamp {
        /// Entity that was queried.
        owner: OwnerRef,
        /// The requested instant.
        at: DateTime<Utc>,
    },
}
