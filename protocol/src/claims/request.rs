//! Off-chain requests.
//!
//! A [`Request`] asks for a verifiable claim, or proves that the sender
//! controls its issuer identifier. It carries one free-form `data` claim.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::payload::ClaimPayload;

/// Request payload. `data` is omitted from the claims when absent; an
/// explicit `"data": null` reads back as `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub data: Option<Value>,
}

impl Request {
    pub fn new(data: Value) -> Self {
        Self { data: Some(data) }
    }
}

impl ClaimPayload for Request {}

/// A field that is present is `Some`, even when its value is `null`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}
