//! # Envelope Codec
//!
//! Framing of the compact form:
//!
//! ```text
//! base64url(header) "." base64url(claims) [ "." base64url(signature) ]
//! ```
//!
//! An [`Envelope`] keeps the exact header and claims segments it was built
//! or parsed from. The signature always covers those received bytes, never a
//! re-encoding, so an envelope produced elsewhere with a different JSON
//! layout still verifies.
//!
//! Unsigned envelopes serialize to two segments with no trailing dot. A
//! trailing dot (empty third segment) is accepted on parse and read as
//! unsigned.
//!
//! The same length limit applies when building, signing and parsing, so
//! anything this codec produces it can also read back.
//!
//! A signing key must belong to the issuer: the identifier part of `kid`
//! has to equal `iss`. Signing refuses any other key id, and verification
//! answers `false` for it without asking the resolver.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::header::Header;
use crate::claims::canonical;
use crate::claims::metadata::Metadata;
use crate::claims::payload::ClaimPayload;
use crate::config::{MAX_ENVELOPE_LENGTH, SEGMENT_SEPARATOR, SIGNED_SEGMENTS, UNSIGNED_SEGMENTS};
use crate::crypto::encoding::{decode_segment, encode_segment};
use crate::crypto::keys::{KeyType, PrivateKey, PublicKey, Signature};
use crate::crypto::signatures;
use crate::envelope::EnvelopeError;
use crate::identity::did::KeyId;
use crate::identity::resolver::KeyResolver;

/// A built or parsed envelope.
///
/// There is no mutation API. Signing returns a new envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    header: Header,
    metadata: Metadata,
    payload: Map<String, Value>,
    header_segment: String,
    payload_segment: String,
    signature: Option<Signature>,
}

impl Envelope {
    /// Build an unsigned envelope from metadata and a payload.
    ///
    /// # Errors
    ///
    /// - `FieldCollision` if the payload uses a reserved claim name.
    /// - `MalformedPayload` if the payload is not a JSON object.
    /// - `TooLarge` if the serialized envelope would exceed the length limit.
    pub fn build_unsigned<P: ClaimPayload>(
        metadata: &Metadata,
        payload: &P,
    ) -> Result<Self, EnvelopeError> {
        let payload = payload.to_claims()?;
        let header = Header::unsigned();

        let header_segment = encode_segment(header.encode()?);
        let payload_segment =
            encode_segment(canonical::encode_claims(&metadata.to_entries(), &payload)?);
        check_length(serialized_length(&header_segment, &payload_segment, None))?;

        debug!(
            message_id = %metadata.message_id,
            issuer = %metadata.issuer,
            fields = payload.len(),
            "built unsigned envelope"
        );

        Ok(Self {
            header,
            metadata: metadata.clone(),
            payload,
            header_segment,
            payload_segment,
            signature: None,
        })
    }

    /// Parse the compact form.
    ///
    /// # Errors
    ///
    /// - `TooLarge` if the input exceeds the length limit.
    /// - `InvalidFormat` unless there are 2 or 3 segments with non-empty
    ///   header and claims.
    /// - `MalformedPayload` if a segment fails to decode, the header is
    ///   inconsistent, or the signature presence disagrees with the header.
    /// - `InvalidIdentifier` if `iss` or `sub` is not a valid identifier.
    pub fn parse(serialized: &str) -> Result<Self, EnvelopeError> {
        check_length(serialized.len())?;

        let segments: Vec<&str> = serialized.split(SEGMENT_SEPARATOR).collect();
        let (header_segment, payload_segment, signature_segment) = match segments.as_slice() {
            [h, p] => (*h, *p, None),
            [h, p, s] => (*h, *p, Some(*s).filter(|s| !s.is_empty())),
            other => {
                return Err(EnvelopeError::InvalidFormat(format!(
                    "expected {UNSIGNED_SEGMENTS} or {SIGNED_SEGMENTS} segments, found {}",
                    other.len()
                )))
            }
        };
        if header_segment.is_empty() || payload_segment.is_empty() {
            return Err(EnvelopeError::InvalidFormat(
                "header and claims segments must be non-empty".into(),
            ));
        }

        let header = Header::decode(&decode(header_segment, "header")?)?;
        let mut payload = canonical::decode_object(&decode(payload_segment, "claims")?)?;
        let metadata = Metadata::from_claims(&mut payload)?;

        let signature = signature_segment
            .map(|s| decode(s, "signature").map(Signature::from_bytes))
            .transpose()?;

        match (header.is_signed(), signature.is_some()) {
            (true, false) => {
                return Err(EnvelopeError::MalformedPayload(
                    "header names a signing key but the signature is missing".into(),
                ))
            }
            (false, true) => {
                return Err(EnvelopeError::MalformedPayload(
                    "signature present but the header names no algorithm".into(),
                ))
            }
            _ => {}
        }

        Ok(Self {
            header,
            metadata,
            payload,
            header_segment: header_segment.to_string(),
            payload_segment: payload_segment.to_string(),
            signature,
        })
    }

    /// Attach `signature` made by `kid` with a key of type `alg`.
    ///
    /// The header is rewritten to carry `alg` and `kid` and its segment is
    /// re-derived. The claims segment is kept byte for byte.
    ///
    /// # Errors
    ///
    /// - `IssuerMismatch` if `kid` is not a key of the issuer.
    /// - `TooLarge` if the signed envelope would exceed the length limit.
    pub fn append_signature(
        self,
        signature: Signature,
        alg: KeyType,
        kid: KeyId,
    ) -> Result<Self, EnvelopeError> {
        self.check_issuer_owns(&kid)?;
        let header = Header::signed(alg, kid);
        let header_segment = encode_segment(header.encode()?);
        check_length(serialized_length(
            &header_segment,
            &self.payload_segment,
            Some(&signature),
        ))?;
        Ok(Self {
            header,
            header_segment,
            signature: Some(signature),
            ..self
        })
    }

    /// Sign with `key`, naming `kid` as the verification key.
    ///
    /// The signature covers the signed header (carrying `alg` and `kid`) and
    /// the claims segment. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// - `AlreadySigned` if the envelope carries a signature.
    /// - `IssuerMismatch` if `kid` is not a key of the issuer.
    /// - `UnsupportedKeyType` / `InvalidKey` from the signature engine.
    /// - `TooLarge` if the signed envelope would exceed the length limit.
    pub fn sign(&self, kid: &KeyId, key: &PrivateKey) -> Result<Self, EnvelopeError> {
        if let Some(existing) = &self.header.kid {
            return Err(EnvelopeError::AlreadySigned {
                kid: existing.to_string(),
            });
        }
        self.check_issuer_owns(kid)?;

        let alg = key.key_type();
        let header = Header::signed(alg, kid.clone());
        let header_segment = encode_segment(header.encode()?);
        let input = signing_input(&header_segment, &self.payload_segment);
        let signature = signatures::sign(input.as_bytes(), key)?;
        check_length(serialized_length(
            &header_segment,
            &self.payload_segment,
            Some(&signature),
        ))?;

        debug!(kid = %kid, alg = %alg, message_id = %self.metadata.message_id, "signed envelope");

        Ok(Self {
            header,
            metadata: self.metadata.clone(),
            payload: self.payload.clone(),
            header_segment,
            payload_segment: self.payload_segment.clone(),
            signature: Some(signature),
        })
    }

    /// Check the signature against `key`.
    ///
    /// False when unsigned, when `kid` is not a key of the issuer, when
    /// `key` is not of the header's algorithm, or when the signature does
    /// not verify.
    pub fn verify_with(&self, key: &PublicKey) -> bool {
        let (Some(alg), Some(kid), Some(signature)) =
            (self.header.alg, &self.header.kid, &self.signature)
        else {
            return false;
        };
        if !self.issuer_owns(kid) {
            return false;
        }
        if alg != key.key_type() {
            warn!(
                kid = %kid,
                header_alg = %alg,
                key_type = %key.key_type(),
                "algorithm does not match the resolved key"
            );
            return false;
        }
        signatures::verify(self.signing_input().as_bytes(), signature, key)
    }

    /// Resolve the header's `kid` at `endpoint` and check the signature.
    ///
    /// Resolution failures are errors. Everything else that stops the
    /// signature from checking out is `Ok(false)`.
    pub async fn verify<R>(&self, endpoint: &str, resolver: &R) -> Result<bool, EnvelopeError>
    where
        R: KeyResolver + ?Sized,
    {
        let Some(kid) = &self.header.kid else {
            warn!(
                message_id = %self.metadata.message_id,
                "verification requested for an unsigned envelope"
            );
            return Ok(false);
        };
        if !self.issuer_owns(kid) {
            return Ok(false);
        }

        let key = resolver.resolve(kid, endpoint).await?;
        let valid = self.verify_with(&key);
        if valid {
            debug!(kid = %kid, endpoint, "signature verified");
        } else {
            warn!(kid = %kid, endpoint, "signature verification failed");
        }
        Ok(valid)
    }

    /// True when `kid` names a key of the issuer. Logs a warning otherwise.
    fn issuer_owns(&self, kid: &KeyId) -> bool {
        let owned = kid.identifier() == self.metadata.issuer;
        if !owned {
            warn!(
                kid = %kid,
                issuer = %self.metadata.issuer,
                "key id does not belong to the issuer"
            );
        }
        owned
    }

    /// `IssuerMismatch` unless `kid` names a key of the issuer.
    pub(crate) fn check_issuer_owns(&self, kid: &KeyId) -> Result<(), EnvelopeError> {
        if kid.identifier() != self.metadata.issuer {
            return Err(EnvelopeError::IssuerMismatch {
                kid: kid.to_string(),
                issuer: self.metadata.issuer.to_string(),
            });
        }
        Ok(())
    }

    /// The compact form: two segments when unsigned, three when signed.
    pub fn serialize(&self) -> String {
        let mut out = signing_input(&self.header_segment, &self.payload_segment);
        if let Some(signature) = &self.signature {
            out.push(SEGMENT_SEPARATOR);
            out.push_str(&encode_segment(signature.as_bytes()));
        }
        out
    }

    /// `header_segment "." claims_segment`, the bytes a signature covers.
    pub fn signing_input(&self) -> String {
        signing_input(&self.header_segment, &self.payload_segment)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Non-reserved claims.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn header_segment(&self) -> &str {
        &self.header_segment
    }

    pub fn payload_segment(&self) -> &str {
        &self.payload_segment
    }
}

fn signing_input(header_segment: &str, payload_segment: &str) -> String {
    let mut input = String::with_capacity(header_segment.len() + payload_segment.len() + 1);
    input.push_str(header_segment);
    input.push(SEGMENT_SEPARATOR);
    input.push_str(payload_segment);
    input
}

fn serialized_length(
    header_segment: &str,
    payload_segment: &str,
    signature: Option<&Signature>,
) -> usize {
    let signature_length = signature.map_or(0, |s| 1 + encode_segment(s.as_bytes()).len());
    header_segment.len() + 1 + payload_segment.len() + signature_length
}

fn check_length(length: usize) -> Result<(), EnvelopeError> {
    if length > MAX_ENVELOPE_LENGTH {
        return Err(EnvelopeError::TooLarge {
            length,
            limit: MAX_ENVELOPE_LENGTH,
        });
    }
    Ok(())
}

fn decode(segment: &str, what: &str) -> Result<Vec<u8>, EnvelopeError> {
    decode_segment(segment)
        .map_err(|e| EnvelopeError::MalformedPayload(format!("{what} segment: {e}")))
}
