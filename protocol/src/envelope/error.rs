//! Error types for envelope construction, parsing, signing and verification.
//!
//! Every fallible envelope operation returns an [`EnvelopeError`]. A failed
//! cryptographic check is NOT an error: verification answers `Ok(false)`.
//! Errors mean the envelope could not be built, read, signed, or checked.

use thiserror::Error;

use crate::crypto::keys::{KeyError, KeyType};
use crate::crypto::signatures::SignatureError;
use crate::identity::did::IdentifierError;
use crate::identity::resolver::ResolverError;

/// Errors that can occur while handling an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Wrong number of segments, or an empty header or claims segment.
    #[error("invalid envelope format: {0}")]
    InvalidFormat(String),

    /// The serialized envelope would exceed the length limit.
    #[error("envelope is {length} bytes, limit is {limit}")]
    TooLarge {
        /// Serialized length in bytes.
        length: usize,
        /// The enforced limit.
        limit: usize,
    },

    /// A segment is not valid base64url, not valid JSON, or the JSON does
    /// not have the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload serializes a claim name owned by the metadata.
    #[error("payload field '{0}' collides with a reserved metadata claim")]
    FieldCollision(String),

    /// `iss` or `sub` is not a scheme-prefixed identifier.
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    /// No signature scheme is registered for the signing key's type.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(KeyType),

    /// The signing key is malformed.
    #[error("invalid signing key: {0}")]
    InvalidKey(#[from] KeyError),

    /// The envelope already carries a signature.
    #[error("envelope is already signed by {kid}")]
    AlreadySigned {
        /// Key id of the existing signature.
        kid: String,
    },

    /// `kid` names a key of some identifier other than the issuer.
    #[error("key {kid} does not belong to issuer {issuer}")]
    IssuerMismatch {
        /// The key id offered for signing.
        kid: String,
        /// The envelope's `iss`.
        issuer: String,
    },

    /// The key published for `kid` is not the public half of the signing key.
    #[error("signing key does not match the key published for {kid}")]
    KeyMismatch {
        /// The key id that was resolved.
        kid: String,
    },

    /// The resolver answered, and has no key for `kid`.
    #[error("key not found: {kid} at {endpoint}")]
    KeyNotFound {
        /// The key id that was looked up.
        kid: String,
        /// The endpoint that was asked.
        endpoint: String,
    },

    /// The resolver could not be reached or could not answer.
    #[error("key resolution unavailable at {endpoint}: {reason}")]
    ResolutionUnavailable {
        /// The endpoint that was asked.
        endpoint: String,
        /// What went wrong.
        reason: String,
    },
}

impl From<SignatureError> for EnvelopeError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::UnsupportedKeyType(kt) => EnvelopeError::UnsupportedKeyType(kt),
            SignatureError::InvalidKey(e) => EnvelopeError::InvalidKey(e),
        }
    }
}

impl From<ResolverError> for EnvelopeError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::KeyNotFound { kid, endpoint } => {
                EnvelopeError::KeyNotFound { kid, endpoint }
            }
            ResolverError::ResolutionUnavailable { endpoint, reason } => {
                EnvelopeError::ResolutionUnavailable { endpoint, reason }
            }
        }
    }
}

impl EnvelopeError {
    /// True for the two errors that come from key resolution.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            EnvelopeError::KeyNotFound { .. } | EnvelopeError::ResolutionUnavailable { .. }
        )
    }
}
