//! # Vericlaim Protocol: Core Library
//!
//! Signed identity claims in a compact, JWT-shaped envelope:
//!
//! ```text
//! base64url(header) "." base64url(claims) [ "." base64url(signature) ]
//! ```
//!
//! A claim is issued by a scheme-prefixed identifier (usually a DID), signed
//! with one of that identifier's keys, and verified by resolving the key id
//! carried in the header back to a public key.
//!
//! ## Architecture
//!
//! - **config**: envelope constants and reserved claim names.
//! - **crypto**: key types, the signature scheme registry, base64url segments.
//! - **identity**: identifiers, key ids, DID documents and key resolution.
//! - **claims**: reserved metadata, typed payloads, canonical JSON.
//! - **envelope**: building, parsing, signing and verifying envelopes.
//!
//! ## Quick tour
//!
//! ```
//! use serde_json::json;
//! use vericlaim_protocol::prelude::*;
//!
//! # tokio_test_block(async {
//! let issuer = Identifier::parse("did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w").unwrap();
//! let kid = issuer.key_id("keys-1").unwrap();
//! let key = PrivateKey::generate(KeyType::EcdsaP256).unwrap();
//!
//! let resolver = MemoryKeyResolver::new();
//! resolver.insert("http://127.0.0.1:20334", kid.clone(), key.public_key().unwrap());
//!
//! let request = RequestMessage::new(
//!     Metadata::issue(issuer),
//!     Request::new(json!({"email": "request@email.com"})),
//! )
//! .unwrap();
//! let signed = request.sign(&kid, &key).unwrap();
//!
//! let received = RequestMessage::deserialize(&signed.serialize()).unwrap();
//! assert!(received.verify("http://127.0.0.1:20334", &resolver).await.unwrap());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```
//!
//! ## Design rules
//!
//! 1. A failed signature check is `Ok(false)`. A key that cannot be found is
//!    an error.
//! 2. Signatures cover the received segment bytes, never a re-encoding.
//! 3. Signing returns a new value. Nothing is mutated after the fact.

pub mod claims;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod identity;

/// The types most callers need.
pub mod prelude {
    pub use crate::claims::{ClaimPayload, EmptyPayload, Metadata, Request};
    pub use crate::crypto::{KeyType, PrivateKey, PublicKey, Signature};
    pub use crate::envelope::{Envelope, EnvelopeError, Message, RequestMessage};
    pub use crate::identity::{Identifier, KeyId, KeyResolver, MemoryKeyResolver};
}
