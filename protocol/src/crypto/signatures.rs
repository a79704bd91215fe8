//! # Digital Signatures
//!
//! Signing and verification of envelope signing inputs, dispatched by key
//! type through a [`SchemeRegistry`].
//!
//! Every scheme implements [`SignatureScheme`]. The registry maps a
//! [`KeyType`] to its scheme; the process-wide default registry (see
//! [`registry`]) carries:
//!
//! - **ES256**: ECDSA over P-256 with SHA-256, RFC 6979 deterministic nonces,
//!   64-byte `r || s` signatures.
//! - **ES256K**: the same over secp256k1. Signatures are normalized to low-S.
//! - **EdDSA**: Ed25519 (RFC 8032), verified strictly.
//!
//! SM2 keys are recognised but have no registered scheme, so signing with one
//! fails with [`SignatureError::UnsupportedKeyType`].
//!
//! ## Verification never errors
//!
//! [`verify`] answers yes or no. Malformed signature bytes, a public key that
//! is not a curve point, a wrong key, a tampered message: all of them are
//! `false`. Callers that need to tell "could not check" apart from "checked
//! and invalid" get that distinction one layer up, from the key resolver.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use p256::ecdsa::signature::{Signer, Verifier};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::Zeroizing;

use super::keys::{KeyError, KeyType, PrivateKey, PublicKey, Signature};
use crate::config::PRIVATE_KEY_LENGTH;

/// Errors during signing and key derivation.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("no signature scheme registered for key type {0}")]
    UnsupportedKeyType(KeyType),

    #[error(transparent)]
    InvalidKey(#[from] KeyError),
}

/// A single asymmetric signature scheme.
///
/// Schemes are stateless: key material is borrowed for one call and never
/// retained. Implementations must be cheap to share across threads.
pub trait SignatureScheme: Send + Sync {
    /// The key type this scheme handles.
    fn key_type(&self) -> KeyType;

    /// Fresh secret material from the OS RNG.
    fn generate_secret(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]>;

    /// Encode the public key matching `secret`.
    fn derive_public_key(&self, secret: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Sign `message` with `secret`.
    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Check `signature` over `message` against `public_key`.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}

// ---------------------------------------------------------------------------
// ES256
// ---------------------------------------------------------------------------

/// ECDSA over NIST P-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaP256Scheme;

impl SignatureScheme for EcdsaP256Scheme {
    fn key_type(&self) -> KeyType {
        KeyType::EcdsaP256
    }

    fn generate_secret(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]> {
        let key = p256::ecdsa::SigningKey::random(&mut OsRng);
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        out.copy_from_slice(&key.to_bytes());
        out
    }

    fn derive_public_key(&self, secret: &[u8]) -> Result<Vec<u8>, KeyError> {
        let key =
            p256::ecdsa::SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(key.verifying_key().to_encoded_point(true).as_bytes().to_vec())
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let key =
            p256::ecdsa::SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidPrivateKey)?;
        let signature: p256::ecdsa::Signature = key.sign(message);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
            return false;
        };
        key.verify(message, &signature).is_ok()
    }
}

// ---------------------------------------------------------------------------
// ES256K
// ---------------------------------------------------------------------------

/// ECDSA over secp256k1.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaSecp256k1Scheme;

impl SignatureScheme for EcdsaSecp256k1Scheme {
    fn key_type(&self) -> KeyType {
        KeyType::EcdsaSecp256k1
    }

    fn generate_secret(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]> {
        let key = k256::ecdsa::SigningKey::random(&mut OsRng);
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        out.copy_from_slice(&key.to_bytes());
        out
    }

    fn derive_public_key(&self, secret: &[u8]) -> Result<Vec<u8>, KeyError> {
        let key =
            k256::ecdsa::SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(key.verifying_key().to_encoded_point(true).as_bytes().to_vec())
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let key =
            k256::ecdsa::SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidPrivateKey)?;
        let signature: k256::ecdsa::Signature = key.sign(message);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = k256::ecdsa::VerifyingKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
            return false;
        };
        key.verify(message, &signature).is_ok()
    }
}

// ---------------------------------------------------------------------------
// EdDSA
// ---------------------------------------------------------------------------

/// Ed25519 with strict verification.
///
/// Strict mode rejects small-order keys and non-canonical `R` encodings that
/// lenient verifiers accept.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Scheme;

impl Ed25519Scheme {
    fn signing_key(secret: &[u8]) -> Result<ed25519_dalek::SigningKey, KeyError> {
        let seed: [u8; PRIVATE_KEY_LENGTH] =
            secret.try_into().map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed))
    }
}

impl SignatureScheme for Ed25519Scheme {
    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    fn generate_secret(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]> {
        let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        Zeroizing::new(key.to_bytes())
    }

    fn derive_public_key(&self, secret: &[u8]) -> Result<Vec<u8>, KeyError> {
        let key = Self::signing_key(secret)?;
        Ok(key.verifying_key().to_bytes().to_vec())
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let key = Self::signing_key(secret)?;
        Ok(key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
            return false;
        };
        let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
            return false;
        };
        key.verify_strict(message, &signature).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps key types to the schemes that handle them.
///
/// Adding a scheme is a [`register`](Self::register) call; the sign and
/// verify entry points do not change.
#[derive(Clone, Default)]
pub struct SchemeRegistry {
    schemes: HashMap<KeyType, Arc<dyn SignatureScheme>>,
}

impl SchemeRegistry {
    /// A registry with no schemes at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with ES256, ES256K and EdDSA.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(EcdsaP256Scheme));
        registry.register(Arc::new(EcdsaSecp256k1Scheme));
        registry.register(Arc::new(Ed25519Scheme));
        registry
    }

    /// Register `scheme` for its key type, replacing any previous one.
    pub fn register(&mut self, scheme: Arc<dyn SignatureScheme>) {
        self.schemes.insert(scheme.key_type(), scheme);
    }

    pub fn supports(&self, key_type: KeyType) -> bool {
        self.schemes.contains_key(&key_type)
    }

    /// Look up the scheme for `key_type`.
    pub fn scheme(&self, key_type: KeyType) -> Result<&dyn SignatureScheme, SignatureError> {
        self.schemes
            .get(&key_type)
            .map(|s| s.as_ref())
            .ok_or(SignatureError::UnsupportedKeyType(key_type))
    }

    /// Sign `signing_input` with `key`, dispatched by the key's type.
    pub fn sign(&self, signing_input: &[u8], key: &PrivateKey) -> Result<Signature, SignatureError> {
        let scheme = self.scheme(key.key_type())?;
        let bytes = scheme.sign(key.secret_bytes(), signing_input)?;
        Ok(Signature::from_bytes(bytes))
    }

    /// Verify `signature` over `signing_input`. Unregistered key types
    /// verify as `false`.
    pub fn verify(&self, signing_input: &[u8], signature: &Signature, key: &PublicKey) -> bool {
        match self.scheme(key.key_type()) {
            Ok(scheme) => scheme.verify(key.as_bytes(), signing_input, signature.as_bytes()),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.schemes.keys().map(|kt| kt.algorithm()).collect();
        types.sort_unstable();
        f.debug_struct("SchemeRegistry").field("schemes", &types).finish()
    }
}

/// The process-wide default registry.
pub fn registry() -> &'static SchemeRegistry {
    static REGISTRY: OnceLock<SchemeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(SchemeRegistry::with_defaults)
}

/// Sign `signing_input` with the default registry.
///
/// # Example
///
/// ```
/// use vericlaim_protocol::crypto::{sign, verify, KeyType, PrivateKey};
///
/// let key = PrivateKey::generate(KeyType::Ed25519).unwrap();
/// let sig = sign(b"header.payload", &key).unwrap();
/// assert!(verify(b"header.payload", &sig, &key.public_key().unwrap()));
/// ```
pub fn sign(signing_input: &[u8], key: &PrivateKey) -> Result<Signature, SignatureError> {
    registry().sign(signing_input, key)
}

/// Verify with the default registry. Returns `false` on any failure.
pub fn verify(signing_input: &[u8], signature: &Signature, key: &PublicKey) -> bool {
    registry().verify(signing_input, signature, key)
}
