//! # Identifiers and Key Ids
//!
//! Claim issuers and subjects are scheme-prefixed identifiers, typically
//! W3C DIDs:
//!
//! ```text
//! did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w
//! ```
//!
//! A key id points at one key inside an identifier's key set:
//!
//! ```text
//! did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w#keys-1
//! ```
//!
//! Only syntax is checked here. Whether an identifier exists, or whether it
//! actually owns the key a `kid` names, is the key resolver's business.
//!
//! ## Standards References
//!
//! - [DID Core v1.0](https://www.w3.org/TR/did-core/)
//! - [RFC 3986 fragments](https://www.rfc-editor.org/rfc/rfc3986#section-3.5)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{IDENTIFIER_SEPARATOR, KEY_ID_SEPARATOR};

/// The URI scheme of decentralized identifiers.
const DID_SCHEME: &str = "did";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// Not of the form `<scheme>:<rest>`.
    #[error("invalid identifier '{0}': expected '<scheme>:<id>'")]
    InvalidIdentifier(String),

    /// Not of the form `<identifier>#<fragment>`.
    #[error("invalid key id '{0}': expected '<identifier>#<fragment>'")]
    InvalidKeyId(String),
}

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// A scheme-prefixed identifier such as `did:ont:...` or `urn:uuid:...`.
///
/// # Examples
///
/// ```
/// use vericlaim_protocol::identity::Identifier;
///
/// let id: Identifier = "did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w".parse().unwrap();
/// assert_eq!(id.scheme(), "did");
/// assert_eq!(id.did_method(), Some("ont"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Validate and wrap an identifier string.
    ///
    /// The scheme must start with an ASCII letter and contain only ASCII
    /// alphanumerics, `+`, `-` or `.` (RFC 3986 section 3.1); the remainder
    /// must be non-empty and free of whitespace and `#`.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let invalid = || IdentifierError::InvalidIdentifier(s.to_string());

        let (scheme, rest) = s.split_once(IDENTIFIER_SEPARATOR).ok_or_else(invalid)?;

        let mut chars = scheme.chars();
        let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(invalid());
        }

        if rest.is_empty()
            || rest.contains(KEY_ID_SEPARATOR)
            || rest.chars().any(char::is_whitespace)
        {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `:`.
    pub fn scheme(&self) -> &str {
        self.0
            .split_once(IDENTIFIER_SEPARATOR)
            .map(|(scheme, _)| scheme)
            .unwrap_or_default()
    }

    /// For `did:<method>:<id>` identifiers, the method name.
    pub fn did_method(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, IDENTIFIER_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(DID_SCHEME), Some(method), Some(id)) if !method.is_empty() && !id.is_empty() => {
                Some(method)
            }
            _ => None,
        }
    }

    /// Build the key id `<self>#<fragment>`.
    pub fn key_id(&self, fragment: &str) -> Result<KeyId, IdentifierError> {
        KeyId::parse(&format!("{}{}{}", self.0, KEY_ID_SEPARATOR, fragment))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// KeyId
// ---------------------------------------------------------------------------

/// A key identifier: `<identifier>#<fragment>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId {
    raw: String,
    split: usize,
}

impl KeyId {
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let invalid = || IdentifierError::InvalidKeyId(s.to_string());

        let (identifier, fragment) = s.split_once(KEY_ID_SEPARATOR).ok_or_else(invalid)?;
        Identifier::parse(identifier).map_err(|_| invalid())?;
        if fragment.is_empty()
            || fragment.contains(KEY_ID_SEPARATOR)
            || fragment.chars().any(char::is_whitespace)
        {
            return Err(invalid());
        }

        Ok(Self {
            raw: s.to_string(),
            split: identifier.len(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The identifier that owns the key.
    pub fn identifier(&self) -> Identifier {
        Identifier(self.raw[..self.split].to_string())
    }

    /// The fragment after `#`, e.g. `keys-1`.
    pub fn fragment(&self) -> &str {
        &self.raw[self.split + 1..]
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for KeyId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyId> for String {
    fn from(value: KeyId) -> Self {
        value.raw
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
