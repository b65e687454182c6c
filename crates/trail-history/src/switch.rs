//! Process-wide versioning switch.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn recording on or off for every [`Recorder`](crate::Recorder) in the
/// process. Enabled by default. Reads are unaffected.
pub fn set_enabled(enabled: bool) {
    let previous = ENABLED.swap(enabled, Ordering::SeqCst);
    if previous != enabled {
        info!(enabled, "versioning switched");
    }
}

/// Whether recording is currently enabled process-wide.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}
