//! # Typed Messages
//!
//! [`Message<P>`] pairs an [`Envelope`] with its decoded payload. It is the
//! entry point most callers want:
//!
//! ```
//! use serde_json::json;
//! use vericlaim_protocol::claims::{Metadata, Request};
//! use vericlaim_protocol::envelope::Message;
//! use vericlaim_protocol::identity::Identifier;
//!
//! let issuer = Identifier::parse("did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w").unwrap();
//! let metadata = Metadata::new("1", issuer.clone(), 1525800823).with_subject(issuer);
//! let request = Message::new(metadata, Request::new(json!({"email": "request@email.com"}))).unwrap();
//!
//! let parsed = Message::<Request>::deserialize(&request.serialize()).unwrap();
//! assert_eq!(parsed.payload(), request.payload());
//! ```

use tracing::debug;

use super::codec::Envelope;
use crate::claims::metadata::Metadata;
use crate::claims::payload::ClaimPayload;
use crate::claims::request::Request;
use crate::crypto::keys::PrivateKey;
use crate::envelope::EnvelopeError;
use crate::identity::did::KeyId;
use crate::identity::resolver::KeyResolver;

/// A message carrying a [`Request`].
pub type RequestMessage = Message<Request>;

/// An envelope together with its typed payload.
#[derive(Debug, Clone)]
pub struct Message<P> {
    envelope: Envelope,
    payload: P,
}

impl<P: ClaimPayload> Message<P> {
    /// Build an unsigned message.
    pub fn new(metadata: Metadata, payload: P) -> Result<Self, EnvelopeError> {
        let envelope = Envelope::build_unsigned(&metadata, &payload)?;
        Ok(Self { envelope, payload })
    }

    /// Parse the compact form and decode the payload as `P`.
    pub fn deserialize(serialized: &str) -> Result<Self, EnvelopeError> {
        let envelope = Envelope::parse(serialized)?;
        let payload = P::from_claims(envelope.payload().clone())?;
        Ok(Self { envelope, payload })
    }

    /// A signed copy. `self` stays unsigned.
    pub fn sign(&self, kid: &KeyId, key: &PrivateKey) -> Result<Self, EnvelopeError>
    where
        P: Clone,
    {
        Ok(Self {
            envelope: self.envelope.sign(kid, key)?,
            payload: self.payload.clone(),
        })
    }

    /// Sign after checking that `endpoint` publishes the public half of
    /// `key` under `kid`.
    ///
    /// # Errors
    ///
    /// - `IssuerMismatch` if `kid` is not a key of the issuer. The resolver
    ///   is not consulted.
    /// - `KeyNotFound` / `ResolutionUnavailable` from the resolver.
    /// - `KeyMismatch` if the published key is a different key.
    pub async fn sign_with_resolver<R>(
        &self,
        endpoint: &str,
        kid: &KeyId,
        key: &PrivateKey,
        resolver: &R,
    ) -> Result<Self, EnvelopeError>
    where
        P: Clone,
        R: KeyResolver + ?Sized,
    {
        self.envelope.check_issuer_owns(kid)?;
        let published = resolver.resolve(kid, endpoint).await?;
        if published != key.public_key()? {
            return Err(EnvelopeError::KeyMismatch {
                kid: kid.to_string(),
            });
        }
        debug!(kid = %kid, endpoint, "published key matches signing key");
        self.sign(kid, key)
    }

    /// See [`Envelope::verify`].
    pub async fn verify<R>(&self, endpoint: &str, resolver: &R) -> Result<bool, EnvelopeError>
    where
        R: KeyResolver + ?Sized,
    {
        self.envelope.verify(endpoint, resolver).await
    }

    pub fn serialize(&self) -> String {
        self.envelope.serialize()
    }

    pub fn metadata(&self) -> &Metadata {
        self.envelope.metadata()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn is_signed(&self) -> bool {
        self.envelope.is_signed()
    }

    pub fn into_parts(self) -> (Envelope, P) {
        (self.envelope, self.payload)
    }
}
