//! # Canonical JSON
//!
//! Deterministic JSON bytes for claims.
//!
//! The rules:
//!
//! 1. Compact output: no whitespace outside strings.
//! 2. Object keys in ascending byte order, at every nesting level.
//! 3. The one exception is [`encode_claims`], whose leading entries (the
//!    reserved metadata claims) keep the fixed order they are given in.
//!
//! Key order never depends on insertion order or on how the caller's map
//! type iterates, so a `HashMap` payload encodes the same every time.
//! Strings and numbers are written by `serde_json`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::envelope::EnvelopeError;

/// Canonical bytes for any serializable value.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EnvelopeError> {
    let value = serde_json::to_value(value).map_err(malformed)?;
    let mut out = Vec::new();
    write_value(&value, &mut out)?;
    Ok(out)
}

/// Canonical bytes for a claims object: `head` entries first, in the order
/// given, then `tail` entries sorted by key.
///
/// The caller guarantees `head` and `tail` share no keys.
pub fn encode_claims(
    head: &[(&str, Value)],
    tail: &Map<String, Value>,
) -> Result<Vec<u8>, EnvelopeError> {
    let mut sorted: Vec<(&String, &Value)> = tail.iter().collect();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let entries = head
        .iter()
        .map(|(k, v)| (*k, v))
        .chain(sorted.into_iter().map(|(k, v)| (k.as_str(), v)));

    let mut out = Vec::new();
    write_object(entries, &mut out)?;
    Ok(out)
}

/// Decode bytes into `T`. Any failure is `MalformedPayload`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EnvelopeError> {
    serde_json::from_slice(bytes).map_err(malformed)
}

/// Decode bytes that must hold a JSON object.
pub fn decode_object(bytes: &[u8]) -> Result<Map<String, Value>, EnvelopeError> {
    match decode::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(EnvelopeError::MalformedPayload(format!(
            "expected a JSON object, found {}",
            kind(&other)
        ))),
    }
}

/// Human-readable JSON kind, for error messages.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), EnvelopeError> {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
            sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
            write_object(sorted.into_iter().map(|(k, v)| (k.as_str(), v)), out)
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
            Ok(())
        }
        scalar => serde_json::to_writer(out, scalar).map_err(malformed),
    }
}

fn write_object<'a>(
    entries: impl Iterator<Item = (&'a str, &'a Value)>,
    out: &mut Vec<u8>,
) -> Result<(), EnvelopeError> {
    out.push(b'{');
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            out.push(b',');
        }
        serde_json::to_writer(&mut *out, key).map_err(malformed)?;
        out.push(b':');
        write_value(value, out)?;
    }
    out.push(b'}');
    Ok(())
}

fn malformed(err: serde_json::Error) -> EnvelopeError {
    EnvelopeError::MalformedPayload(err.to_string())
}
