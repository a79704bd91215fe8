//! # Cryptographic Primitives
//!
//! Everything that touches key material or signature bytes lives here.
//!
//! - **keys**: key types, private/public key wrappers, raw signatures.
//! - **signatures**: the scheme registry and the sign/verify entry points.
//! - **encoding**: RFC 4648 base64url without padding, the segment alphabet.
//!
//! Nothing here is hand-rolled. P-256 and secp256k1 come from the RustCrypto
//! `p256`/`k256` crates, Ed25519 from `ed25519-dalek`. This module only picks
//! the scheme and moves bytes.

pub mod encoding;
pub mod keys;
pub mod signatures;

pub use encoding::{decode_segment, encode_segment};
pub use keys::{KeyError, KeyType, PrivateKey, PublicKey, Signature};
pub use signatures::{registry, sign, verify, SchemeRegistry, SignatureError, SignatureScheme};
