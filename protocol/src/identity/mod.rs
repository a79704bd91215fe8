//! # Identity Module
//!
//! Who signed a claim, and which key they signed it with.
//!
//! 1. **Identifiers**: scheme-prefixed ids (`did:ont:...`) for issuers and
//!    subjects, and key ids (`did:ont:...#keys-1`) for signing keys.
//! 2. **Documents**: the key-bearing subset of W3C DID documents.
//! 3. **Resolution**: the [`KeyResolver`] seam that turns a key id into a
//!    public key during verification, plus an in-memory implementation.

pub mod did;
pub mod document;
pub mod resolver;

pub use did::{Identifier, IdentifierError, KeyId};
pub use document::{DidDocument, DocumentError, VerificationMethod};
pub use resolver::{KeyFileError, KeyRecord, KeyResolver, MemoryKeyResolver, ResolverError};
