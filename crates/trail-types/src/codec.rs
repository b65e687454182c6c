//! Snapshot codec: turns an [`AttributeMap`] into a stored payload and back.
//!
//! The payload is an opaque string as far as the store is concerned. Any
//! codec works as long as `decode(encode(m)) == m` for every value type the
//! host uses.

use crate::AttributeMap;

/// Errors raised while encoding or decoding a snapshot payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON (de)serialization failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes attribute mappings into snapshot payloads.
pub trait SnapshotCodec: Send + Sync {
    /// Encode a mapping into a payload string.
    fn encode(&self, attributes: &AttributeMap) -> Result<String, CodecError>;

    /// Decode a payload string into a mapping.
    fn decode(&self, payload: &str) -> Result<AttributeMap, CodecError>;
}

/// JSON snapshot codec (the default).
///
/// Values are adjacently tagged (`{"type":"int","value":3}`) so that
/// integers, floats, text and timestamps survive the round trip unchanged.
/// `NaN` and the infinities are written as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl SnapshotCodec for JsonCodec {
    fn encode(&self, attributes: &AttributeMap) -> Result<String, CodecError> {
        Ok(serde_json::to_string(attributes)?)
    }

    fn decode(&self, payload: &str) -> Result<AttributeMap, CodecError> {
        Ok(serde_json::from_str(payload)?)
    }
}
