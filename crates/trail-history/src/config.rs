//! Recording and audit configuration.

use serde::{Deserialize, Serialize};

use crate::diff::DEFAULT_IGNORED_ATTRIBUTES;

/// Settings shared by [`Recorder`](crate::Recorder) and
/// [`AuditOptions`](crate::AuditOptions), usually read from a `[trail]`
/// TOML section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Process-wide recording switch.
    pub enabled: bool,
    /// Attributes left out of audit trail diffs.
    pub ignore_attributes: Vec<String>,
    /// Entity types whose lifecycle events are not recorded.
    pub disabled_types: Vec<String>,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ignore_attributes: DEFAULT_IGNORED_ATTRIBUTES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            disabled_types: Vec::new(),
        }
    }
}
