//! # Claim Metadata
//!
//! The reserved claims every envelope carries:
//!
//! | Field        | Claim | Required |
//! |--------------|-------|----------|
//! | `message_id` | `jti` | yes      |
//! | `issuer`     | `iss` | yes      |
//! | `subject`    | `sub` | no       |
//! | `issued_at`  | `iat` | yes      |
//! | `expire_at`  | `exp` | no       |
//!
//! On the wire they come first, in the order above, followed by the payload
//! fields. Optional claims that are absent are left out entirely.

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::canonical::kind;
use crate::config::{
    CLAIM_EXPIRE_AT, CLAIM_ISSUED_AT, CLAIM_ISSUER, CLAIM_MESSAGE_ID, CLAIM_SUBJECT,
};
use crate::envelope::EnvelopeError;
use crate::identity::did::Identifier;

/// Reserved envelope claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub message_id: String,
    pub issuer: Identifier,
    pub subject: Option<Identifier>,
    /// Unix seconds.
    pub issued_at: i64,
    /// Unix seconds.
    pub expire_at: Option<i64>,
}

impl Metadata {
    pub fn new(message_id: impl Into<String>, issuer: Identifier, issued_at: i64) -> Self {
        Self {
            message_id: message_id.into(),
            issuer,
            subject: None,
            issued_at,
            expire_at: None,
        }
    }

    /// Fresh metadata for `issuer`: a random v4 message id, issued now.
    pub fn issue(issuer: Identifier) -> Self {
        Self::new(Uuid::new_v4().to_string(), issuer, Utc::now().timestamp())
    }

    pub fn with_subject(mut self, subject: Identifier) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_expire_at(mut self, expire_at: i64) -> Self {
        self.expire_at = Some(expire_at);
        self
    }

    /// True when `exp` is set and `now` is at or past it.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expire_at.is_some_and(|exp| now >= exp)
    }

    /// Claims in wire order, optional ones omitted when absent.
    pub(crate) fn to_entries(&self) -> Vec<(&'static str, Value)> {
        let mut entries = Vec::with_capacity(5);
        entries.push((CLAIM_MESSAGE_ID, Value::from(self.message_id.as_str())));
        entries.push((CLAIM_ISSUER, Value::from(self.issuer.as_str())));
        if let Some(sub) = &self.subject {
            entries.push((CLAIM_SUBJECT, Value::from(sub.as_str())));
        }
        entries.push((CLAIM_ISSUED_AT, Value::from(self.issued_at)));
        if let Some(exp) = self.expire_at {
            entries.push((CLAIM_EXPIRE_AT, Value::from(exp)));
        }
        entries
    }

    /// Take the reserved claims out of `claims`, leaving only payload fields.
    ///
    /// An explicit `null` for `sub` or `exp` reads as absent.
    pub(crate) fn from_claims(claims: &mut Map<String, Value>) -> Result<Self, EnvelopeError> {
        let message_id = required_string(claims, CLAIM_MESSAGE_ID)?;
        let issuer = Identifier::parse(&required_string(claims, CLAIM_ISSUER)?)?;
        let subject = optional_string(claims, CLAIM_SUBJECT)?
            .map(|s| Identifier::parse(&s))
            .transpose()?;
        let issued_at = optional_integer(claims, CLAIM_ISSUED_AT)?
            .ok_or_else(|| missing(CLAIM_ISSUED_AT))?;
        let expire_at = optional_integer(claims, CLAIM_EXPIRE_AT)?;

        Ok(Self {
            message_id,
            issuer,
            subject,
            issued_at,
            expire_at,
        })
    }
}

fn missing(name: &str) -> EnvelopeError {
    EnvelopeError::MalformedPayload(format!("missing claim '{name}'"))
}

fn wrong_type(name: &str, expected: &str, found: &Value) -> EnvelopeError {
    EnvelopeError::MalformedPayload(format!(
        "claim '{name}' must be {expected}, found {}",
        kind(found)
    ))
}

fn required_string(claims: &mut Map<String, Value>, name: &str) -> Result<String, EnvelopeError> {
    optional_string(claims, name)?.ok_or_else(|| missing(name))
}

fn optional_string(
    claims: &mut Map<String, Value>,
    name: &str,
) -> Result<Option<String>, EnvelopeError> {
    match claims.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(wrong_type(name, "a string", &other)),
    }
}

fn optional_integer(
    claims: &mut Map<String, Value>,
    name: &str,
) -> Result<Option<i64>, EnvelopeError> {
    match claims.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| wrong_type(name, "an integer", &Value::Number(n))),
        Some(other) => Err(wrong_type(name, "an integer", &other)),
    }
}
