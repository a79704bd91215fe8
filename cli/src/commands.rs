//! # Command Implementations
//!
//! Each subcommand is a function from parsed arguments to the text it
//! prints, so tests can drive them without spawning the binary.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

use vericlaim_protocol::claims::{canonical, Metadata, Request};
use vericlaim_protocol::crypto::{decode_segment, PrivateKey};
use vericlaim_protocol::envelope::{Envelope, Message, RequestMessage};
use vericlaim_protocol::identity::{Identifier, KeyId, KeyRecord, MemoryKeyResolver};

use crate::cli::{InspectArgs, KeygenArgs, RequestArgs, SignArgs, VerifyArgs};

/// Output of `keygen`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedKey {
    pub key_type: String,
    pub private_key: String,
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<BTreeMap<String, KeyRecord>>,
}

pub fn keygen(args: &KeygenArgs) -> Result<GeneratedKey> {
    let key = PrivateKey::generate(args.key_type)
        .with_context(|| format!("cannot generate a {} key", args.key_type))?;
    let public_key = key.public_key()?;

    let key_file = args
        .kid
        .as_deref()
        .map(|kid| -> Result<_> {
            let kid = KeyId::parse(kid)?;
            Ok(BTreeMap::from([(kid.to_string(), KeyRecord::from(&public_key))]))
        })
        .transpose()?;

    tracing::info!(key_type = %args.key_type, "generated key");
    Ok(GeneratedKey {
        key_type: args.key_type.to_string(),
        private_key: key.to_hex(),
        public_key: public_key.to_hex(),
        key_file,
    })
}

/// Build an unsigned request envelope.
pub fn request(args: &RequestArgs) -> Result<String> {
    let issuer = Identifier::parse(&args.issuer).context("invalid --issuer")?;

    let mut metadata = match (&args.message_id, args.issued_at) {
        (Some(id), Some(iat)) => Metadata::new(id.clone(), issuer, iat),
        (id, iat) => {
            let mut issued = Metadata::issue(issuer);
            if let Some(id) = id {
                issued.message_id = id.clone();
            }
            if let Some(iat) = iat {
                issued.issued_at = iat;
            }
            issued
        }
    };
    if let Some(subject) = &args.subject {
        metadata = metadata.with_subject(Identifier::parse(subject).context("invalid --subject")?);
    }
    if let Some(exp) = args.expire_at {
        metadata = metadata.with_expire_at(exp);
    }

    let data = args
        .data
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--data is not valid JSON")?;

    let message = RequestMessage::new(metadata, Request { data })?;
    Ok(message.serialize())
}

/// Sign an envelope, optionally checking the key against a key file first.
pub async fn sign(args: &SignArgs) -> Result<String> {
    let kid = KeyId::parse(&args.kid).context("invalid --kid")?;
    let key = PrivateKey::from_hex(args.key_type, args.private_key.trim())
        .context("invalid --private-key")?;
    let message = Message::<Map<String, Value>>::deserialize(&read_envelope(&args.envelope)?)
        .context("cannot parse envelope")?;

    let signed = match &args.keys {
        Some(path) => {
            let resolver = load_resolver(path, &args.endpoint)?;
            message
                .sign_with_resolver(&args.endpoint, &kid, &key, &resolver)
                .await?
        }
        None => message.sign(&kid, &key)?,
    };
    Ok(signed.serialize())
}

/// Header, claims and signature state of an envelope, as JSON.
pub fn inspect(args: &InspectArgs) -> Result<Value> {
    let envelope = Envelope::parse(&read_envelope(&args.envelope)?)?;

    let header: Value = canonical::decode(&decode_segment(envelope.header_segment())?)?;
    let claims: Value = canonical::decode(&decode_segment(envelope.payload_segment())?)?;
    let now = chrono::Utc::now().timestamp();

    Ok(json!({
        "header": header,
        "claims": claims,
        "signed": envelope.is_signed(),
        "signature": envelope.signature().map(|s| s.to_hex()),
        "expired": envelope.metadata().is_expired_at(now),
    }))
}

/// Verify an envelope against a key file.
pub async fn verify(args: &VerifyArgs) -> Result<bool> {
    let resolver = load_resolver(&args.keys, &args.endpoint)?;
    let envelope =
        Envelope::parse(&read_envelope(&args.envelope)?).context("cannot parse envelope")?;
    if !envelope.is_signed() {
        bail!("envelope is not signed");
    }
    let valid = envelope
        .verify(&args.endpoint, &resolver)
        .await
        .context("key resolution failed")?;
    Ok(valid)
}

fn load_resolver(path: &Path, endpoint: &str) -> Result<MemoryKeyResolver> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    let resolver = MemoryKeyResolver::new();
    let count = resolver
        .load_key_file(endpoint, &json)
        .with_context(|| format!("invalid key file {}", path.display()))?;
    tracing::debug!(path = %path.display(), endpoint, keys = count, "loaded key file");
    Ok(resolver)
}

/// The argument itself, or stdin when it is `-`.
fn read_envelope(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.trim().to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read envelope from stdin")?;
    Ok(buf.trim().to_string())
}
