//! Attribute-level differences between two snapshots.
//!
//! Pure functions, no side effects. Output is sorted by attribute name so
//! that audit output is reproducible.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use trail_types::{AttributeMap, Value};

/// Attributes ignored by default: `updated_at` changes on every write.
pub const DEFAULT_IGNORED_ATTRIBUTES: &[&str] = &["updated_at"];

/// One changed attribute. `None` means the attribute was absent on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub attribute: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Attributes whose values differ between `before` and `after`.
///
/// A key present on one side only is reported with `None` on the other.
/// Sorted by attribute name, ascending.
pub fn differences(before: &AttributeMap, after: &AttributeMap) -> Vec<Change> {
    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let b = before.get(key);
            let a = after.get(key);
            (b != a).then(|| Change {
                attribute: key.clone(),
                before: b.cloned(),
                after: a.cloned(),
            })
        })
        .collect()
}

/// Remove every attribute named in `ignore`.
pub fn strip_ignored(attributes: &mut AttributeMap, ignore: &BTreeSet<String>) {
    attributes.retain(|key, _| !ignore.contains(key));
}

/// [`differences`] after dropping `ignore` from both sides.
pub fn differences_ignoring(
    before: &AttributeMap,
    after: &AttributeMap,
    ignore: &BTreeSet<String>,
) -> Vec<Change> {
    if ignore.is_empty() {
        return differences(before, after);
    }
    let mut before = before.clone();
    let mut after = after.clone();
    strip_ignored(&mut before, ignore);
    strip_ignored(&mut after, ignore);
    differences(&before, &after)
}
