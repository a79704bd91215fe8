//! # CLI Interface
//!
//! Defines the command-line argument structure for `vericlaim` using
//! `clap` derive. Subcommands: `keygen`, `request`, `sign`, `inspect`,
//! `verify` and `version`.
//!
//! Envelope arguments accept `-` to read the envelope from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vericlaim_protocol::config::DEFAULT_ENDPOINT;
use vericlaim_protocol::crypto::KeyType;

use crate::logging::LogFormat;

/// Build, sign, inspect and verify signed identity claims.
#[derive(Parser, Debug)]
#[command(
    name = "vericlaim",
    about = "Signed identity-claim envelopes",
    version,
    propagate_version = true
)]
pub struct VericlaimCli {
    /// Log output format. Logs go to stderr.
    #[arg(long, global = true, value_enum, env = "VERICLAIM_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a signing key and print it with its public half.
    Keygen(KeygenArgs),
    /// Build an unsigned request envelope.
    Request(RequestArgs),
    /// Sign an unsigned envelope.
    Sign(SignArgs),
    /// Decode an envelope and print its header and claims as JSON.
    Inspect(InspectArgs),
    /// Verify a signed envelope against a key file.
    ///
    /// Exits non-zero when the signature does not verify.
    Verify(VerifyArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Key type: es256, es256k or eddsa.
    #[arg(long, short = 't', default_value = "es256")]
    pub key_type: KeyType,

    /// Also print a key-file entry publishing the key under this key id.
    #[arg(long)]
    pub kid: Option<String>,
}

/// Arguments for the `request` subcommand.
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// Issuer identifier, e.g. `did:ont:...`.
    #[arg(long)]
    pub issuer: String,

    /// Subject identifier.
    #[arg(long)]
    pub subject: Option<String>,

    /// Request data as JSON.
    #[arg(long)]
    pub data: Option<String>,

    /// Message id. A random UUID when omitted.
    #[arg(long)]
    pub message_id: Option<String>,

    /// Issue time in unix seconds. Now when omitted.
    #[arg(long)]
    pub issued_at: Option<i64>,

    /// Expiry in unix seconds.
    #[arg(long)]
    pub expire_at: Option<i64>,
}

/// Arguments for the `sign` subcommand.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Key id the verifier will resolve, `<identifier>#<fragment>`.
    #[arg(long)]
    pub kid: String,

    /// Hex-encoded private key.
    ///
    /// Prefer the environment variable over the flag so the key stays out
    /// of shell history.
    #[arg(long, env = "VERICLAIM_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Key type of the private key: es256, es256k or eddsa.
    #[arg(long, short = 't', default_value = "es256")]
    pub key_type: KeyType,

    /// Key file to check the signing key against before signing.
    #[arg(long)]
    pub keys: Option<PathBuf>,

    /// Endpoint the key file is registered under.
    #[arg(long, env = "VERICLAIM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// The unsigned envelope, or `-` for stdin.
    pub envelope: String,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// The envelope, or `-` for stdin.
    pub envelope: String,
}

/// Arguments for the `verify` subcommand.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Key file: a JSON object mapping key ids to `{"type", "publicKey"}`.
    #[arg(long, env = "VERICLAIM_KEYS")]
    pub keys: PathBuf,

    /// Endpoint to resolve key ids at.
    #[arg(long, env = "VERICLAIM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// The signed envelope, or `-` for stdin.
    pub envelope: String,
}
