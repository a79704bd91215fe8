//! # Key Management
//!
//! Key material for every signature scheme an envelope can carry.
//!
//! A key is always tagged with its [`KeyType`]. The type decides which
//! scheme signs with it, which `alg` value lands in the envelope header, and
//! how the public half is encoded:
//!
//! | Key type         | `alg`     | Public key encoding          |
//! |------------------|-----------|------------------------------|
//! | `EcdsaP256`      | `ES256`   | SEC1 point (33 or 65 bytes)  |
//! | `EcdsaSecp256k1` | `ES256K`  | SEC1 point (33 or 65 bytes)  |
//! | `Ed25519`        | `EdDSA`   | 32 raw bytes                 |
//! | `Sm2`            | `SM2-SM3` | SEC1 point, no scheme here   |
//!
//! ## Security considerations
//!
//! - Private key bytes sit in a `Zeroizing` buffer and are wiped on drop.
//! - `Debug` on a private key prints the key type and nothing else.
//! - Key bytes are never logged. Only key ids and key types go to `tracing`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use super::signatures::{self, SignatureError};
use crate::config::{
    ALG_EDDSA, ALG_ES256, ALG_ES256K, ALG_SM2, COMPRESSED_POINT_LENGTH,
    ED25519_PUBLIC_KEY_LENGTH, PRIVATE_KEY_LENGTH,
};

/// Length of an uncompressed SEC1 point (`0x04 || x || y`).
const UNCOMPRESSED_POINT_LENGTH: usize = 65;

/// Errors about the shape of key material.
///
/// Curve-level validity (is this scalar in range, is this point on the
/// curve) is checked by the signature scheme when the key is used.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key bytes: expected 32 bytes holding a valid scalar")]
    InvalidPrivateKey,

    #[error("invalid public key bytes for {0}")]
    InvalidPublicKey(KeyType),

    #[error("invalid hex encoding")]
    InvalidHex,

    #[error("unknown key type: {0}")]
    UnknownKeyType(String),
}

// ---------------------------------------------------------------------------
// KeyType
// ---------------------------------------------------------------------------

/// The asymmetric scheme a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    #[serde(rename = "ES256", alias = "es256")]
    EcdsaP256,
    #[serde(rename = "ES256K", alias = "es256k")]
    EcdsaSecp256k1,
    #[serde(rename = "EdDSA", alias = "eddsa")]
    Ed25519,
    #[serde(rename = "SM2-SM3", alias = "sm2")]
    Sm2,
}

impl KeyType {
    /// All key types the envelope format knows about, registered or not.
    pub const ALL: [KeyType; 4] = [
        KeyType::EcdsaP256,
        KeyType::EcdsaSecp256k1,
        KeyType::Ed25519,
        KeyType::Sm2,
    ];

    /// The `alg` header value for signatures made with this key type.
    pub fn algorithm(&self) -> &'static str {
        match self {
            KeyType::EcdsaP256 => ALG_ES256,
            KeyType::EcdsaSecp256k1 => ALG_ES256K,
            KeyType::Ed25519 => ALG_EDDSA,
            KeyType::Sm2 => ALG_SM2,
        }
    }

    /// Maps an `alg` header value back to a key type. Exact match only;
    /// header values are case-sensitive.
    pub fn from_algorithm(alg: &str) -> Option<KeyType> {
        KeyType::ALL.into_iter().find(|kt| kt.algorithm() == alg)
    }

    /// Accepted lengths for the public key encoding of this type.
    fn public_key_lengths(&self) -> &'static [usize] {
        match self {
            KeyType::Ed25519 => &[ED25519_PUBLIC_KEY_LENGTH],
            _ => &[COMPRESSED_POINT_LENGTH, UNCOMPRESSED_POINT_LENGTH],
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.algorithm())
    }
}

impl FromStr for KeyType {
    type Err = KeyError;

    /// Accepts the `alg` name in any case, plus the short aliases used on
    /// the command line (`p256`, `secp256k1`, `ed25519`, `sm2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "es256" | "p256" | "p-256" | "ecdsa" => Ok(KeyType::EcdsaP256),
            "es256k" | "secp256k1" => Ok(KeyType::EcdsaSecp256k1),
            "eddsa" | "ed25519" => Ok(KeyType::Ed25519),
            "sm2-sm3" | "sm2" => Ok(KeyType::Sm2),
            _ => Err(KeyError::UnknownKeyType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// A private signing key tagged with its key type.
///
/// Intentionally does NOT implement `Serialize`. Exporting a secret should
/// be a deliberate call to [`to_hex`](Self::to_hex), never a side effect of
/// putting a key inside a struct that happens to get logged as JSON.
///
/// # Examples
///
/// ```
/// use vericlaim_protocol::crypto::keys::{KeyType, PrivateKey};
///
/// let key = PrivateKey::generate(KeyType::EcdsaP256).unwrap();
/// let public = key.public_key().unwrap();
/// assert_eq!(public.key_type(), KeyType::EcdsaP256);
/// ```
#[derive(Clone)]
pub struct PrivateKey {
    key_type: KeyType,
    bytes: Zeroizing<[u8; PRIVATE_KEY_LENGTH]>,
}

impl PrivateKey {
    /// Generate a fresh key from the OS RNG.
    ///
    /// Fails with `UnsupportedKeyType` when no scheme is registered for
    /// `key_type`, since there is nothing that could generate it.
    pub fn generate(key_type: KeyType) -> Result<Self, SignatureError> {
        let scheme = signatures::registry().scheme(key_type)?;
        Ok(Self {
            key_type,
            bytes: scheme.generate_secret(),
        })
    }

    /// Wrap raw 32-byte secret material.
    ///
    /// Only the length is checked here. Whether the bytes form a valid
    /// scalar for the curve surfaces on first use.
    pub fn from_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; PRIVATE_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self {
            key_type,
            bytes: Zeroizing::new(arr),
        })
    }

    /// Parse a hex-encoded secret. Convenient for fixtures and the CLI;
    /// keep hex secrets out of config files you intend to commit.
    pub fn from_hex(key_type: KeyType, hex_str: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidHex)?);
        Self::from_bytes(key_type, &bytes)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Borrow the raw secret. Crate-internal: only schemes need this.
    pub(crate) fn secret_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Export the secret as hex. **Handle with care.**
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes.as_slice())
    }

    /// Derive the matching public key through the registered scheme.
    pub fn public_key(&self) -> Result<PublicKey, SignatureError> {
        let scheme = signatures::registry().scheme(self.key_type)?;
        let bytes = scheme.derive_public_key(self.secret_bytes())?;
        Ok(PublicKey {
            key_type: self.key_type,
            bytes,
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Not even a prefix. A partial leak is still a leak.
        write!(f, "PrivateKey({}, <redacted>)", self.key_type)
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// The public half of a key, safe to share, log and publish.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key_type: KeyType,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Wrap an encoded public key after checking its length against the
    /// encodings the key type allows.
    pub fn from_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, KeyError> {
        if !key_type.public_key_lengths().contains(&bytes.len()) {
            return Err(KeyError::InvalidPublicKey(key_type));
        }
        Ok(Self {
            key_type,
            bytes: bytes.to_vec(),
        })
    }

    pub fn from_hex(key_type: KeyType, hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidHex)?;
        Self::from_bytes(key_type, &bytes)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Base58 (bitcoin alphabet) encoding, as used by multibase `z` keys.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.bytes).into_string()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key_type, self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "PublicKey({}, {})", self.key_type, &hex_str[..hex_str.len().min(16)])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Raw signature bytes as carried in the third envelope segment.
///
/// No length is enforced here: a signature parsed off the wire may be any
/// length, and a wrong length simply fails verification.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() > 16 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[hex_str.len() - 8..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}
