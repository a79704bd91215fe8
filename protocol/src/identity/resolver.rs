//! # Key Resolution
//!
//! Verification needs the public key a `kid` names. Finding it is delegated
//! to a [`KeyResolver`]: given a key id and the endpoint of the network that
//! anchors the identifier, return the public key together with its type.
//!
//! Two failure modes are kept apart on purpose:
//!
//! - [`ResolverError::KeyNotFound`]: the endpoint answered and has no such key.
//! - [`ResolverError::ResolutionUnavailable`]: the endpoint could not be asked.
//!
//! Neither is a verification result. Both propagate to the caller instead of
//! turning into `false`.
//!
//! [`MemoryKeyResolver`] is an in-process resolver keyed by endpoint. Tests
//! use it directly; the CLI loads it from a JSON key file. A resolver that
//! talks to a live network sits behind the same trait and is not part of
//! this crate.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::did::KeyId;
use super::document::{DidDocument, DocumentError};
use crate::crypto::keys::{KeyError, KeyType, PublicKey};

/// Errors returned by key resolvers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("key not found: {kid} at {endpoint}")]
    KeyNotFound { kid: String, endpoint: String },

    #[error("key resolution unavailable at {endpoint}: {reason}")]
    ResolutionUnavailable { endpoint: String, reason: String },
}

/// Maps a key id to its public key.
///
/// Implementations must be safe to share between tasks: many verifications
/// may resolve concurrently through one resolver.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, kid: &KeyId, endpoint: &str) -> Result<PublicKey, ResolverError>;
}

/// An in-process, per-endpoint key registry.
///
/// An endpoint that was never registered answers `ResolutionUnavailable`,
/// mirroring a network that cannot be reached. A registered endpoint that
/// lacks the key answers `KeyNotFound`.
#[derive(Debug, Default)]
pub struct MemoryKeyResolver {
    endpoints: RwLock<HashMap<String, HashMap<KeyId, PublicKey>>>,
}

impl MemoryKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `endpoint` reachable, with no keys yet.
    pub fn add_endpoint(&self, endpoint: &str) {
        self.endpoints.write().entry(endpoint.to_string()).or_default();
    }

    /// Publish `key` under `kid` at `endpoint`, replacing any previous key.
    pub fn insert(&self, endpoint: &str, kid: KeyId, key: PublicKey) {
        debug!(endpoint, kid = %kid, key_type = %key.key_type(), "registering key");
        self.endpoints
            .write()
            .entry(endpoint.to_string())
            .or_default()
            .insert(kid, key);
    }

    /// Withdraw `kid` from `endpoint`. Returns the removed key.
    pub fn remove(&self, endpoint: &str, kid: &KeyId) -> Option<PublicKey> {
        self.endpoints.write().get_mut(endpoint)?.remove(kid)
    }

    /// Publish every verification method of `document` at `endpoint`.
    /// Returns the number of keys registered.
    pub fn register_document(
        &self,
        endpoint: &str,
        document: &DidDocument,
    ) -> Result<usize, DocumentError> {
        document.validate()?;
        let keys = document
            .verification_method
            .iter()
            .map(|vm| Ok((vm.id.clone(), vm.public_key()?)))
            .collect::<Result<Vec<_>, DocumentError>>()?;

        let count = keys.len();
        self.add_endpoint(endpoint);
        for (kid, key) in keys {
            self.insert(endpoint, kid, key);
        }
        Ok(count)
    }

    /// Load a key file: a JSON object mapping key ids to
    /// `{"type": "<alg>", "publicKey": "<hex>"}`.
    pub fn load_key_file(&self, endpoint: &str, json: &str) -> Result<usize, KeyFileError> {
        let records: HashMap<KeyId, KeyRecord> =
            serde_json::from_str(json).map_err(|e| KeyFileError::Parse(e.to_string()))?;

        let keys = records
            .into_iter()
            .map(|(kid, record)| Ok((kid, PublicKey::from_hex(record.key_type, &record.public_key)?)))
            .collect::<Result<Vec<_>, KeyFileError>>()?;

        let count = keys.len();
        self.add_endpoint(endpoint);
        for (kid, key) in keys {
            self.insert(endpoint, kid, key);
        }
        Ok(count)
    }
}

#[async_trait]
impl KeyResolver for MemoryKeyResolver {
    async fn resolve(&self, kid: &KeyId, endpoint: &str) -> Result<PublicKey, ResolverError> {
        let endpoints = self.endpoints.read();
        let keys = endpoints
            .get(endpoint)
            .ok_or_else(|| ResolverError::ResolutionUnavailable {
                endpoint: endpoint.to_string(),
                reason: "endpoint not registered".to_string(),
            })?;
        keys.get(kid).cloned().ok_or_else(|| ResolverError::KeyNotFound {
            kid: kid.to_string(),
            endpoint: endpoint.to_string(),
        })
    }
}

/// One entry of a key file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    #[serde(rename = "type")]
    pub key_type: KeyType,

    /// Hex-encoded public key.
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl From<&PublicKey> for KeyRecord {
    fn from(key: &PublicKey) -> Self {
        Self {
            key_type: key.key_type(),
            public_key: key.to_hex(),
        }
    }
}

/// Errors loading a key file.
#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("malformed key file: {0}")]
    Parse(String),

    #[error("bad key in key file: {0}")]
    Key(#[from] KeyError),
}
