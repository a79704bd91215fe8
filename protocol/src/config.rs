//! # Protocol Configuration & Constants
//!
//! Every fixed value of the envelope format lives here: the header type,
//! the segment separators, the reserved claim names and the algorithm
//! labels. Changing any of these changes the bytes on the wire, which means
//! every signature ever issued stops verifying. Choose carefully.

// ---------------------------------------------------------------------------
// Envelope Framing
// ---------------------------------------------------------------------------

/// The `typ` header value. Always "JWT", signed or not.
pub const ENVELOPE_TYPE: &str = "JWT";

/// Separator between the header, claims and signature segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// Separator between an identifier and the key fragment inside a `kid`.
pub const KEY_ID_SEPARATOR: char = '#';

/// Separator between the scheme and the rest of an identifier (`did:ont:...`).
pub const IDENTIFIER_SEPARATOR: char = ':';

/// Segment count of an unsigned envelope.
pub const UNSIGNED_SEGMENTS: usize = 2;

/// Segment count of a signed envelope.
pub const SIGNED_SEGMENTS: usize = 3;

/// Upper bound on the serialized envelope length. Claims are small; anything
/// past this is rejected before any decoding work is done.
pub const MAX_ENVELOPE_LENGTH: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Reserved Claim Names
// ---------------------------------------------------------------------------

/// Wire name of `Metadata::message_id`.
pub const CLAIM_MESSAGE_ID: &str = "jti";

/// Wire name of `Metadata::issuer`.
pub const CLAIM_ISSUER: &str = "iss";

/// Wire name of `Metadata::subject`.
pub const CLAIM_SUBJECT: &str = "sub";

/// Wire name of `Metadata::issued_at`.
pub const CLAIM_ISSUED_AT: &str = "iat";

/// Wire name of `Metadata::expire_at`.
pub const CLAIM_EXPIRE_AT: &str = "exp";

/// Claim names owned by the metadata. A payload that serializes any of
/// these is rejected with `FieldCollision`.
pub const RESERVED_CLAIMS: [&str; 5] = [
    CLAIM_MESSAGE_ID,
    CLAIM_ISSUER,
    CLAIM_SUBJECT,
    CLAIM_ISSUED_AT,
    CLAIM_EXPIRE_AT,
];

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// ECDSA over NIST P-256 with SHA-256.
pub const ALG_ES256: &str = "ES256";

/// ECDSA over secp256k1 with SHA-256.
pub const ALG_ES256K: &str = "ES256K";

/// Ed25519 (RFC 8032).
pub const ALG_EDDSA: &str = "EdDSA";

/// SM2 with SM3. Named so that such keys are recognised and refused cleanly.
pub const ALG_SM2: &str = "SM2-SM3";

/// Private scalar length for every supported curve.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Compressed SEC1 point length (prefix byte + x coordinate).
pub const COMPRESSED_POINT_LENGTH: usize = 33;

/// Ed25519 public key length.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;

/// Raw signature length: `r || s` for ECDSA, `R || S` for Ed25519.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Default key-resolution endpoint used by the CLI when none is given.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:20334";

/// Returns true when `name` is one of the metadata-owned claim names.
pub fn is_reserved_claim(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}
