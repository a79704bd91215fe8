//! # Envelope Module
//!
//! The compact signed form of a claim set.
//!
//! - **header**: the `{alg, typ, kid}` segment.
//! - **codec**: building, parsing, signing and verifying [`Envelope`]s.
//! - **message**: [`Message<P>`], an envelope with a typed payload.
//! - **error**: the [`EnvelopeError`] taxonomy shared by all of the above.

pub mod codec;
pub mod error;
pub mod header;
pub mod message;

pub use codec::Envelope;
pub use error::EnvelopeError;
pub use header::Header;
pub use message::{Message, RequestMessage};
