//! Base64url segment encoding.
//!
//! RFC 4648 section 5 alphabet, no `=` padding. Decoding is strict: padding,
//! whitespace and standard-alphabet characters (`+`, `/`) are all rejected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Encode bytes as one envelope segment.
pub fn encode_segment(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode one envelope segment.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(segment)
}
