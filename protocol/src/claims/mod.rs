//! # Claims
//!
//! What an envelope says: the reserved [`Metadata`] claims, a typed
//! [`ClaimPayload`], and the [`canonical`] JSON encoding both are written in.

pub mod canonical;
pub mod metadata;
pub mod payload;
pub mod request;

pub use metadata::Metadata;
pub use payload::{ClaimPayload, EmptyPayload};
pub use request::Request;
