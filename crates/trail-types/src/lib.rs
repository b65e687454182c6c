//! Shared types for Trail.
//!
//! This crate defines the vocabulary used across the workspace:
//! owner identity ([`OwnerRef`]), lifecycle events ([`Event`]), attribute
//! values ([`Value`], [`AttributeMap`]), stored version records
//! ([`Version`], [`NewVersion`], [`VersionId`]), the pluggable snapshot
//! codec ([`SnapshotCodec`], [`JsonCodec`]) and the clocks used to stamp
//! versions ([`Clock`], [`MonotonicClock`], [`ManualClock`]).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod clock;
mod codec;
mod float_repr;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use codec::{CodecError, JsonCodec, SnapshotCodec};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifies the entity instance a version belongs to.
///
/// Stable for the whole lifetime of the entity, including the window where
/// it is still being created and has no durable association yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerRef {
    /// Entity type name, e.g. `"Article"`.
    pub item_type: String,
    /// Entity identifier within its type.
    pub item_id: String,
}

impl OwnerRef {
    /// Build an owner reference from a type name and an id.
    pub fn new(item_type: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.item_type, self.item_id)
    }
}

/// Store-assigned insertion sequence number of a [`Version`].
///
/// Strictly increasing within a store; breaks ties between versions with the
/// same `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(pub u64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The lifecycle event that produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    /// The entity was created. No prior state exists.
    Create,
    /// The entity was about to be updated.
    Update,
    /// The entity was destroyed.
    Destroy,
}

impl Event {
    /// Lowercase name, as shown in audit output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "destroy" => Ok(Self::Destroy),
            other => Err(format!("unknown event: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute values
// ---------------------------------------------------------------------------

/// A single attribute value.
///
/// The set of variants is closed; the history engine only needs equality and
/// a lossless encoding. Floats compare by total order with every `NaN`
/// equal to every other, so every mapping equals itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "float_repr")] f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.total_cmp(b) == Ordering::Equal
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Attribute name → value. Ordered so that encodings are stable.
pub type AttributeMap = BTreeMap<String, Value>;

/// Build an [`AttributeMap`] from `key => value` pairs.
///
/// ```
/// use trail_types::{attributes, Value};
///
/// let attrs = attributes! { "name" => "A", "count" => 3 };
/// assert_eq!(attrs["name"], Value::Text("A".into()));
/// ```
#[macro_export]
macro_rules! attributes {
    () => {
        $crate::AttributeMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::AttributeMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        map
    }};
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// A version record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVersion {
    /// What produced this record.
    pub event: Event,
    /// Which entity this record belongs to.
    pub owner: OwnerRef,
    /// Encoded snapshot of the attributes *before* the event. `None` for
    /// creates.
    pub object: Option<String>,
    /// Who performed the change, if known.
    pub whodunnit: Option<String>,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl NewVersion {
    /// Attach a store-assigned id, producing the immutable record.
    pub fn with_id(self, id: VersionId) -> Version {
        Version {
            id,
            event: self.event,
            owner: self.owner,
            object: self.object,
            whodunnit: self.whodunnit,
            created_at: self.created_at,
        }
    }
}

/// Immutable snapshot of an entity's state just before one lifecycle event.
///
/// Versions of one owner are totally ordered by `(created_at, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Insertion sequence number, assigned by the store.
    pub id: VersionId,
    /// What produced this record.
    pub event: Event,
    /// Which entity this record belongs to.
    pub owner: OwnerRef,
    /// Encoded pre-change snapshot. `None` for creates.
    pub object: Option<String>,
    /// Who performed the change, if known.
    pub whodunnit: Option<String>,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Position of this version in its owner's history.
    pub fn sort_key(&self) -> (DateTime<Utc>, VersionId) {
        (self.created_at, self.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
