//! Claim payloads.
//!
//! Anything that serializes to a JSON object can ride in an envelope. The
//! payload's fields sit next to the metadata claims in one flat object, so
//! a payload must not use the reserved names (`jti`, `iss`, `sub`, `iat`,
//! `exp`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::canonical::kind;
use crate::config::is_reserved_claim;
use crate::envelope::EnvelopeError;

/// A typed claim payload.
///
/// The default methods go through `serde_json`, so implementing the trait is
/// usually a one-liner:
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use vericlaim_protocol::claims::ClaimPayload;
///
/// #[derive(Serialize, Deserialize)]
/// struct Attestation {
///     degree: String,
/// }
///
/// impl ClaimPayload for Attestation {}
/// ```
pub trait ClaimPayload: Serialize + DeserializeOwned {
    /// The payload as a claims object.
    ///
    /// Fails with `MalformedPayload` unless it serializes to a JSON object,
    /// and with `FieldCollision` when it uses a reserved claim name.
    fn to_claims(&self) -> Result<Map<String, Value>, EnvelopeError> {
        let value = serde_json::to_value(self)
            .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))?;
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(EnvelopeError::MalformedPayload(format!(
                    "payload must serialize to a JSON object, found {}",
                    kind(&other)
                )))
            }
        };
        if let Some(name) = map.keys().find(|k| is_reserved_claim(k)) {
            return Err(EnvelopeError::FieldCollision(name.clone()));
        }
        Ok(map)
    }

    /// Rebuild the payload from the non-reserved claims of a parsed envelope.
    fn from_claims(claims: Map<String, Value>) -> Result<Self, EnvelopeError> {
        serde_json::from_value(Value::Object(claims))
            .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))
    }
}

/// Untyped payloads pass through as-is.
impl ClaimPayload for Map<String, Value> {}

/// A payload with no fields. Encodes to `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyPayload {}

impl ClaimPayload for EmptyPayload {}
