//! Helpers for encoding/decoding the per-value payload carried inside each cookie.
//!
//! Every value is wrapped in a single-field envelope before it is signed, so the payload
//! has the same shape whatever the value's type. The codec only sees the envelope bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;

#[derive(Debug, Serialize)]
struct EnvelopeRef<'a> {
    v: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    v: Value,
}

/// Wrap `value` in the envelope and serialize it.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(&EnvelopeRef { v: value })?)
}

/// Unwrap an envelope produced by [`encode_value`].
pub fn decode_value(bytes: &[u8]) -> Result<Value, CodecError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    Ok(envelope.v)
}
