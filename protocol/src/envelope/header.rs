//! Envelope header.
//!
//! `{"typ":"JWT"}` while unsigned, `{"alg":..,"typ":"JWT","kid":..}` once
//! signed. Fields are written in exactly that order.

use serde::{Deserialize, Serialize};

use crate::claims::canonical;
use crate::config::ENVELOPE_TYPE;
use crate::crypto::keys::KeyType;
use crate::envelope::EnvelopeError;
use crate::identity::did::KeyId;

/// The first envelope segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Signature algorithm. Present exactly when `kid` is.
    pub alg: Option<KeyType>,
    pub typ: String,
    pub kid: Option<KeyId>,
}

/// Header as it appears on the wire. `alg` stays a plain string so that an
/// unknown algorithm gets a precise error instead of a serde message.
#[derive(Serialize, Deserialize)]
struct WireHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
    typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
}

impl Header {
    pub fn unsigned() -> Self {
        Self {
            alg: None,
            typ: ENVELOPE_TYPE.to_string(),
            kid: None,
        }
    }

    pub fn signed(alg: KeyType, kid: KeyId) -> Self {
        Self {
            alg: Some(alg),
            typ: ENVELOPE_TYPE.to_string(),
            kid: Some(kid),
        }
    }

    pub fn is_signed(&self) -> bool {
        self.alg.is_some()
    }

    /// Compact JSON in wire field order.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        let wire = WireHeader {
            alg: self.alg.map(|kt| kt.algorithm().to_string()),
            typ: self.typ.clone(),
            kid: self.kid.as_ref().map(|k| k.as_str().to_string()),
        };
        serde_json::to_vec(&wire).map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))
    }

    /// Decode and check a header.
    ///
    /// `typ` must be `JWT`; `alg` and `kid` must both be present or both
    /// absent; `alg` must name a known algorithm (case-sensitive).
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let wire: WireHeader = canonical::decode(bytes)?;

        if wire.typ != ENVELOPE_TYPE {
            return Err(EnvelopeError::MalformedPayload(format!(
                "unexpected header typ '{}'",
                wire.typ
            )));
        }

        let (alg, kid) = match (wire.alg, wire.kid) {
            (None, None) => (None, None),
            (Some(alg), Some(kid)) => {
                let alg = KeyType::from_algorithm(&alg).ok_or_else(|| {
                    EnvelopeError::MalformedPayload(format!("unknown algorithm '{alg}'"))
                })?;
                let kid = KeyId::parse(&kid)
                    .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))?;
                (Some(alg), Some(kid))
            }
            (Some(_), None) => {
                return Err(EnvelopeError::MalformedPayload(
                    "header has 'alg' without 'kid'".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(EnvelopeError::MalformedPayload(
                    "header has 'kid' without 'alg'".into(),
                ))
            }
        };

        Ok(Self {
            alg,
            typ: wire.typ,
            kid,
        })
    }
}
