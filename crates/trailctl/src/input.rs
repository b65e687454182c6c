//! Reading entity state from plain JSON files and command-line arguments.

use std::path::Path;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use trail_types::{AttributeMap, Value};

/// Parse an RFC 3339 timestamp argument.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp {s:?}: {e}"))
}

/// Read a JSON object file into an attribute mapping.
pub fn read_attributes(path: &Path) -> anyhow::Result<AttributeMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    attributes_from_json(&content).with_context(|| format!("invalid attributes in {}", path.display()))
}

/// Convert a plain JSON object (`{"name": "A", "count": 3}`) to attributes.
///
/// Nested objects have no attribute counterpart and are kept as their JSON
/// text.
pub fn attributes_from_json(content: &str) -> anyhow::Result<AttributeMap> {
    let serde_json::Value::Object(object) = serde_json::from_str(content)? else {
        bail!("expected a JSON object");
    };
    object
        .into_iter()
        .map(|(key, value)| {
            let value = value_from_json(value).with_context(|| format!("attribute {key:?}"))?;
            Ok((key, value))
        })
        .collect()
}

fn value_from_json(value: serde_json::Value) -> anyhow::Result<Value> {
    Ok(match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.is_f64() {
                Value::Float(n.as_f64().context("unrepresentable number")?)
            } else {
                bail!("integer {n} does not fit in a signed 64-bit value");
            }
        }
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(value_from_json)
                .collect::<anyhow::Result<_>>()?,
        ),
        object @ serde_json::Value::Object(_) => Value::Text(object.to_string()),
    })
}
