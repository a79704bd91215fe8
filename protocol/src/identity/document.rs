//! # DID Documents
//!
//! The subset of a W3C DID Document needed to find a verification key:
//! the document id and its `verificationMethod` entries.
//!
//! Keys may be published either as `publicKeyHex` or as a base58btc
//! `publicKeyMultibase` (`z` prefix). Multibase keys may carry a multicodec
//! prefix, which is stripped when it matches the method's key type.
//!
//! Fetching documents over the network is out of scope; documents arrive as
//! JSON from whatever transport the caller uses and are fed to
//! [`MemoryKeyResolver::register_document`](super::resolver::MemoryKeyResolver::register_document).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::did::{Identifier, IdentifierError, KeyId};
use crate::crypto::keys::{KeyError, KeyType, PublicKey};

/// DID Core context URI.
const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Verification method types and the key type each one carries.
const METHOD_TYPES: [(&str, KeyType); 4] = [
    ("EcdsaSecp256r1VerificationKey2019", KeyType::EcdsaP256),
    ("EcdsaSecp256k1VerificationKey2019", KeyType::EcdsaSecp256k1),
    ("Ed25519VerificationKey2020", KeyType::Ed25519),
    ("SM2VerificationKey2019", KeyType::Sm2),
];

/// Multicodec varint prefixes for public keys.
const MULTICODEC_PREFIXES: [(KeyType, [u8; 2]); 3] = [
    (KeyType::EcdsaP256, [0x80, 0x24]),
    (KeyType::EcdsaSecp256k1, [0xe7, 0x01]),
    (KeyType::Ed25519, [0xed, 0x01]),
];

/// Errors that can occur while reading a DID document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid DID document: {0}")]
    InvalidDocument(String),

    #[error("unsupported verification method type: {0}")]
    UnsupportedMethodType(String),

    #[error("verification method {0} has no public key material")]
    MissingKeyMaterial(String),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("verification method key: {0}")]
    Key(#[from] KeyError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A DID document, trimmed to what key resolution needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidDocument {
    #[serde(rename = "@context", default)]
    pub context: Vec<String>,

    /// The DID this document describes.
    pub id: Identifier,

    #[serde(rename = "verificationMethod", default)]
    pub verification_method: Vec<VerificationMethod>,

    /// Key ids usable for authentication.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<KeyId>,
}

impl DidDocument {
    /// An empty document for `id`.
    pub fn new(id: Identifier) -> Self {
        Self {
            context: vec![DID_CONTEXT.to_string()],
            id,
            verification_method: Vec::new(),
            authentication: Vec::new(),
        }
    }

    /// Publish `key` under `<id>#<fragment>` as a hex verification method and
    /// reference it from `authentication`. Returns the new key id.
    pub fn add_key(&mut self, fragment: &str, key: &PublicKey) -> Result<KeyId, DocumentError> {
        let kid = self.id.key_id(fragment)?;
        self.verification_method.push(VerificationMethod {
            id: kid.clone(),
            type_: method_type_for(key.key_type()).to_string(),
            controller: self.id.clone(),
            public_key_hex: Some(key.to_hex()),
            public_key_multibase: None,
        });
        self.authentication.push(kid.clone());
        Ok(kid)
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    /// Check that every verification method belongs to this document.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if let Some(foreign) = self
            .verification_method
            .iter()
            .find(|vm| vm.id.identifier() != self.id)
        {
            return Err(DocumentError::InvalidDocument(format!(
                "verification method {} does not belong to {}",
                foreign.id, self.id
            )));
        }
        Ok(())
    }

    /// Find the verification method with id `kid`.
    pub fn find(&self, kid: &KeyId) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| &vm.id == kid)
    }
}

/// One key entry in a DID document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: KeyId,

    #[serde(rename = "type")]
    pub type_: String,

    pub controller: Identifier,

    #[serde(rename = "publicKeyHex", default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,

    #[serde(rename = "publicKeyMultibase", default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

impl VerificationMethod {
    /// The key type named by `type`.
    pub fn key_type(&self) -> Result<KeyType, DocumentError> {
        METHOD_TYPES
            .iter()
            .find(|(name, _)| *name == self.type_)
            .map(|(_, kt)| *kt)
            .ok_or_else(|| DocumentError::UnsupportedMethodType(self.type_.clone()))
    }

    /// Decode the published key material.
    pub fn public_key(&self) -> Result<PublicKey, DocumentError> {
        let key_type = self.key_type()?;

        if let Some(hex_str) = &self.public_key_hex {
            return Ok(PublicKey::from_hex(key_type, hex_str)?);
        }

        if let Some(multibase) = &self.public_key_multibase {
            let encoded = multibase.strip_prefix('z').ok_or_else(|| {
                DocumentError::InvalidDocument(format!(
                    "{}: only base58btc ('z') multibase keys are supported",
                    self.id
                ))
            })?;
            let decoded = bs58::decode(encoded)
                .into_vec()
                .map_err(|e| DocumentError::InvalidDocument(format!("{}: {e}", self.id)))?;
            let raw = strip_multicodec(key_type, &decoded);
            return Ok(PublicKey::from_bytes(key_type, raw)?);
        }

        Err(DocumentError::MissingKeyMaterial(self.id.to_string()))
    }
}

fn method_type_for(key_type: KeyType) -> &'static str {
    METHOD_TYPES
        .iter()
        .find(|(_, kt)| *kt == key_type)
        .map(|(name, _)| *name)
        .unwrap_or("JsonWebKey2020")
}

fn strip_multicodec(key_type: KeyType, bytes: &[u8]) -> &[u8] {
    MULTICODEC_PREFIXES
        .iter()
        .find(|(kt, _)| *kt == key_type)
        .and_then(|(_, prefix)| bytes.strip_prefix(prefix.as_slice()))
        .unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::PrivateKey;

    fn doc_id() -> Identifier {
        Identifier::parse("did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w").unwrap()
    }

    #[test]
    fn add_key_publishes_hex_method() {
        let key = PrivateKey::generate(KeyType::EcdsaP256).unwrap().public_key().unwrap();
        let mut doc = DidDocument::new(doc_id());
        let kid = doc.add_key("keys-1", &key).unwrap();

        let vm = doc.find(&kid).unwrap();
        assert_eq!(vm.type_, "EcdsaSecp256r1VerificationKey2019");
        assert_eq!(vm.public_key().unwrap(), key);
        assert_eq!(doc.authentication, vec![kid]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn json_roundtrip_uses_w3c_field_names() {
        let key = PrivateKey::generate(KeyType::Ed25519).unwrap().public_key().unwrap();
        let mut doc = DidDocument::new(doc_id());
        doc.add_key("keys-1", &key).unwrap();

        let json = doc.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("@context").is_some());
        assert!(value["verificationMethod"][0].get("publicKeyHex").is_some());
        assert!(value["verificationMethod"][0].get("publicKeyMultibase").is_none());

        let parsed = DidDocument::from_json(&json).unwrap();
        assert_eq!(parsed.id, doc.id);
        assert_eq!(parsed.verification_method[0].public_key().unwrap(), key);
    }

    #[test]
    fn multibase_key_with_multicodec_prefix() {
        let key = PrivateKey::generate(KeyType::Ed25519).unwrap().public_key().unwrap();
        let mut bytes = vec![0xed, 0x01];
        bytes.extend_from_slice(key.as_bytes());
        let vm = VerificationMethod {
            id: doc_id().key_id("keys-2").unwrap(),
            type_: "Ed25519VerificationKey2020".into(),
            controller: doc_id(),
            public_key_hex: None,
            public_key_multibase: Some(format!("z{}", bs58::encode(&bytes).into_string())),
        };
        assert_eq!(vm.public_key().unwrap(), key);
    }

    #[test]
    fn multibase_key_without_prefix() {
        let key = PrivateKey::generate(KeyType::EcdsaSecp256k1).unwrap().public_key().unwrap();
        let vm = VerificationMethod {
            id: doc_id().key_id("keys-3").unwrap(),
            type_: "EcdsaSecp256k1VerificationKey2019".into(),
            controller: doc_id(),
            public_key_hex: None,
            public_key_multibase: Some(format!("z{}", key.to_base58())),
        };
        assert_eq!(vm.public_key().unwrap(), key);
    }

    #[test]
    fn unknown_method_type_rejected() {
        let vm = VerificationMethod {
            id: doc_id().key_id("keys-1").unwrap(),
            type_: "RsaVerificationKey2018".into(),
            controller: doc_id(),
            public_key_hex: Some("00".into()),
            public_key_multibase: None,
        };
        assert!(matches!(vm.public_key(), Err(DocumentError::UnsupportedMethodType(_))));
    }

    #[test]
    fn missing_key_material_rejected() {
        let vm = VerificationMethod {
            id: doc_id().key_id("keys-1").unwrap(),
            type_: "Ed25519VerificationKey2020".into(),
            controller: doc_id(),
            public_key_hex: None,
            public_key_multibase: None,
        };
        assert!(matches!(vm.public_key(), Err(DocumentError::MissingKeyMaterial(_))));
    }

    #[test]
    fn foreign_method_fails_validation() {
        let key = PrivateKey::generate(KeyType::Ed25519).unwrap().public_key().unwrap();
        let mut doc = DidDocument::new(doc_id());
        let mut other = DidDocument::new(Identifier::parse("did:ont:Other").unwrap());
        other.add_key("keys-1", &key).unwrap();
        doc.verification_method.extend(other.verification_method);
        assert!(matches!(doc.validate(), Err(DocumentError::InvalidDocument(_))));
    }
}
