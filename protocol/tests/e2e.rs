//! End-to-end tests for the envelope lifecycle.
//!
//! Build, sign, serialize, parse, resolve, verify: each test drives the
//! public API the way a caller would, with an in-memory resolver standing in
//! for the identity network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use vericlaim_protocol::claims::{EmptyPayload, Metadata, Request};
use vericlaim_protocol::crypto::{decode_segment, encode_segment, KeyType, PrivateKey, PublicKey};
use vericlaim_protocol::envelope::{Envelope, EnvelopeError, Header, Message, RequestMessage};
use vericlaim_protocol::identity::{
    Identifier, KeyId, KeyResolver, MemoryKeyResolver, ResolverError,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const ENDPOINT: &str = "http://polaris1.ont.io:20334";
const DID: &str = "did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w";
const KID: &str = "did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w#keys-1";
const PRIVATE_KEY: &str = "eaec4e682c93648d24e198da5ef9a9252abd5355c568cd74fba59f98c0b1a8f4";
const PUBLIC_KEY: &str = "02309270e65964a1fb229054e95f99e48e1dbb1e897e87a6139320b0da82110a1a";

const UNSIGNED: &str = concat!(
    "eyJ0eXAiOiJKV1QifQ.eyJqdGkiOiIxIiwiaXNzIjoiZGlkOm9udDpUR3",
    "BvS0dvMjZ4bW5BMWltZ0x3THZZSDJuaFduTjYyRzl3Iiwic3ViIjoiZGl",
    "kOm9udDpUR3BvS0dvMjZ4bW5BMWltZ0x3THZZSDJuaFduTjYyRzl3Iiwi",
    "aWF0IjoxNTI1ODAwODIzLCJkYXRhIjp7ImVtYWlsIjoicmVxdWVzdEBlb",
    "WFpbC5jb20ifX0",
);

const SIGNED_HEADER: &str = concat!(
    "eyJhbGciOiJFUzI1NiIsInR5cCI6IkpXVCIsImtpZCI6ImRpZDpvbnQ6V",
    "Edwb0tHbzI2eG1uQTFpbWdMd0x2WUgybmhXbk42Mkc5dyNrZXlzLTEifQ",
);

fn did() -> Identifier {
    Identifier::parse(DID).unwrap()
}

fn kid() -> KeyId {
    KeyId::parse(KID).unwrap()
}

fn private_key() -> PrivateKey {
    PrivateKey::from_hex(KeyType::EcdsaP256, PRIVATE_KEY).unwrap()
}

fn fixture_request() -> RequestMessage {
    let metadata = Metadata::new("1", did(), 1525800823).with_subject(did());
    Message::new(metadata, Request::new(json!({"email": "request@email.com"}))).unwrap()
}

fn resolver_with(kid: KeyId, key: PublicKey) -> MemoryKeyResolver {
    let resolver = MemoryKeyResolver::new();
    resolver.insert(ENDPOINT, kid, key);
    resolver
}

fn fixture_resolver() -> MemoryKeyResolver {
    resolver_with(kid(), PublicKey::from_hex(KeyType::EcdsaP256, PUBLIC_KEY).unwrap())
}

/// Flip one character of a base64url segment to another valid one.
fn tamper(segment: &str, at: usize) -> String {
    let mut chars: Vec<char> = segment.chars().collect();
    chars[at] = if chars[at] == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}

/// Never answers.
struct PendingResolver;

#[async_trait]
impl KeyResolver for PendingResolver {
    async fn resolve(&self, _kid: &KeyId, _endpoint: &str) -> Result<PublicKey, ResolverError> {
        futures::future::pending().await
    }
}

/// Counts lookups, then delegates.
struct CountingResolver {
    inner: MemoryKeyResolver,
    calls: AtomicUsize,
}

#[async_trait]
impl KeyResolver for CountingResolver {
    async fn resolve(&self, kid: &KeyId, endpoint: &str) -> Result<PublicKey, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.resolve(kid, endpoint).await
    }
}

// ---------------------------------------------------------------------------
// Known vectors
// ---------------------------------------------------------------------------

#[test]
fn fixture_public_key_matches_private_key() {
    assert_eq!(private_key().public_key().unwrap().to_hex(), PUBLIC_KEY);
}

#[test]
fn serializes_known_request() {
    assert_eq!(fixture_request().serialize(), UNSIGNED);
}

#[test]
fn deserializes_known_request() {
    let request = RequestMessage::deserialize(UNSIGNED).unwrap();
    let meta = request.metadata();
    assert_eq!(meta.message_id, "1");
    assert_eq!(meta.issuer.as_str(), DID);
    assert_eq!(meta.subject.as_ref().map(Identifier::as_str), Some(DID));
    assert_eq!(meta.issued_at, 1525800823);
    assert_eq!(meta.expire_at, None);
    assert!(!request.is_signed());
    assert_eq!(
        request.payload().data.as_ref().unwrap()["email"],
        json!("request@email.com")
    );
}

#[tokio::test]
async fn signs_known_request() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap();
    let serialized = signed.serialize();
    let parts: Vec<&str> = serialized.split('.').collect();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], SIGNED_HEADER);
    assert_eq!(format!("{}.{}", parts[0], parts[1]), format!("{SIGNED_HEADER}.{}", &UNSIGNED[19..]));
    assert_eq!(decode_segment(parts[2]).unwrap().len(), 64);

    let received = RequestMessage::deserialize(&serialized).unwrap();
    assert!(received.verify(ENDPOINT, &fixture_resolver()).await.unwrap());
}

#[test]
fn ecdsa_signing_is_deterministic() {
    let a = fixture_request().sign(&kid(), &private_key()).unwrap();
    let b = fixture_request().sign(&kid(), &private_key()).unwrap();
    assert_eq!(a.serialize(), b.serialize());
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn unsigned_round_trip_is_byte_identical() {
    let once = Envelope::parse(UNSIGNED).unwrap().serialize();
    let twice = Envelope::parse(&once).unwrap().serialize();
    assert_eq!(once, UNSIGNED);
    assert_eq!(twice, UNSIGNED);
}

#[test]
fn signed_round_trip_keeps_every_segment() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap().serialize();
    assert_eq!(Envelope::parse(&signed).unwrap().serialize(), signed);
}

#[test]
fn optional_claims_round_trip_as_absent() {
    let meta = Metadata::new("m", did(), 1);
    let serialized = Message::new(meta.clone(), EmptyPayload {}).unwrap().serialize();
    let claims = decode_segment(serialized.split('.').nth(1).unwrap()).unwrap();
    let text = String::from_utf8(claims).unwrap();
    assert!(!text.contains("sub"));
    assert!(!text.contains("exp"));
    assert!(!text.contains("null"));

    let parsed = Message::<EmptyPayload>::deserialize(&serialized).unwrap();
    assert_eq!(parsed.metadata(), &meta);
}

#[test]
fn expiry_survives_round_trip() {
    let meta = Metadata::new("m", did(), 100).with_expire_at(200);
    let serialized = Message::new(meta, Request::default()).unwrap().serialize();
    let parsed = RequestMessage::deserialize(&serialized).unwrap();
    assert_eq!(parsed.metadata().expire_at, Some(200));
    assert!(parsed.metadata().is_expired_at(200));
}

#[test]
fn nested_payload_is_sorted_and_preserved() {
    let mut payload = Map::new();
    payload.insert("zeta".into(), json!([3, {"b": null, "a": true}]));
    payload.insert("alpha".into(), json!({"y": 1.5, "x": "text"}));
    let meta = Metadata::new("n", did(), 1);

    let envelope = Envelope::build_unsigned(&meta, &payload).unwrap();
    let claims = decode_segment(envelope.payload_segment()).unwrap();
    assert_eq!(
        String::from_utf8(claims).unwrap(),
        r#"{"jti":"n","iss":"did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w","iat":1,"alpha":{"x":"text","y":1.5},"zeta":[3,{"a":true,"b":null}]}"#
    );
    let parsed = Envelope::parse(&envelope.serialize()).unwrap();
    assert_eq!(parsed.payload(), &payload);
}

#[test]
fn envelope_from_other_producer_keeps_its_bytes() {
    // Claims written with a different key order and spacing still
    // re-serialize exactly as received.
    let header = encode_segment(br#"{"typ":"JWT"}"#);
    let claims = encode_segment(
        br#"{ "iat": 7, "data": {"b": 1, "a": 2}, "iss": "did:x:A", "jti": "q" }"#,
    );
    let serialized = format!("{header}.{claims}");
    let parsed = Envelope::parse(&serialized).unwrap();
    assert_eq!(parsed.serialize(), serialized);
    assert_eq!(parsed.metadata().issued_at, 7);
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verification_is_idempotent() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap();
    let resolver = fixture_resolver();
    for _ in 0..3 {
        assert!(signed.verify(ENDPOINT, &resolver).await.unwrap());
    }
    assert_eq!(signed.serialize().split('.').count(), 3);
}

#[tokio::test]
async fn tampered_claims_fail_verification() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap().serialize();
    let parts: Vec<&str> = signed.split('.').collect();
    let resolver = fixture_resolver();

    // Position 40 sits inside the issuer string, so the claims stay valid JSON.
    let forged = format!("{}.{}.{}", parts[0], tamper(parts[1], 40), parts[2]);
    match Envelope::parse(&forged) {
        Ok(envelope) => assert!(!envelope.verify(ENDPOINT, &resolver).await.unwrap()),
        Err(err) => assert!(!err.is_resolution_error()),
    }
}

#[tokio::test]
async fn tampered_signature_fails_verification() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap().serialize();
    let parts: Vec<&str> = signed.split('.').collect();
    let forged = format!("{}.{}.{}", parts[0], parts[1], tamper(parts[2], 5));

    let envelope = Envelope::parse(&forged).unwrap();
    assert!(!envelope.verify(ENDPOINT, &fixture_resolver()).await.unwrap());
}

#[tokio::test]
async fn swapped_claims_fail_verification() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap().serialize();
    let (header, rest) = signed.split_once('.').unwrap();
    let signature = rest.rsplit_once('.').unwrap().1;

    let other = Message::new(
        Metadata::new("2", did(), 1525800823).with_subject(did()),
        Request::new(json!({"email": "request@email.com"})),
    )
    .unwrap()
    .serialize();
    let other_claims = other.split('.').nth(1).unwrap();

    let forged = Envelope::parse(&format!("{header}.{other_claims}.{signature}")).unwrap();
    assert!(!forged.verify(ENDPOINT, &fixture_resolver()).await.unwrap());
}

#[tokio::test]
async fn wrong_public_key_fails_verification() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap();
    let stranger = PrivateKey::generate(KeyType::EcdsaP256).unwrap();
    let resolver = resolver_with(kid(), stranger.public_key().unwrap());
    assert!(!signed.verify(ENDPOINT, &resolver).await.unwrap());
}

#[tokio::test]
async fn key_of_another_identity_cannot_speak_for_the_issuer() {
    let victim = Identifier::parse("did:ont:Victim").unwrap();
    let mallory_kid = KeyId::parse("did:ont:Mallory#keys-1").unwrap();
    let mallory = PrivateKey::generate(KeyType::EcdsaP256).unwrap();

    let claims = Envelope::build_unsigned(
        &Metadata::new("1", victim.clone(), 1525800823),
        &Request::new(json!({"role": "admin"})),
    )
    .unwrap();
    assert!(matches!(
        claims.sign(&mallory_kid, &mallory),
        Err(EnvelopeError::IssuerMismatch { .. })
    ));

    let header = Header::signed(KeyType::EcdsaP256, mallory_kid.clone());
    let header = encode_segment(header.encode().unwrap());
    let input = format!("{header}.{}", claims.payload_segment());
    let signature = vericlaim_protocol::crypto::sign(input.as_bytes(), &mallory).unwrap();
    let forged = RequestMessage::deserialize(&format!(
        "{input}.{}",
        encode_segment(signature.as_bytes())
    ))
    .unwrap();
    assert_eq!(forged.metadata().issuer, victim);

    let resolver = CountingResolver {
        inner: resolver_with(mallory_kid, mallory.public_key().unwrap()),
        calls: AtomicUsize::new(0),
    };
    assert!(!forged.verify(ENDPOINT, &resolver).await.unwrap());
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unsigned_envelope_verifies_false() {
    let request = RequestMessage::deserialize(UNSIGNED).unwrap();
    assert!(!request.verify(ENDPOINT, &fixture_resolver()).await.unwrap());
}

#[tokio::test]
async fn resolution_errors_propagate() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap();

    let empty = MemoryKeyResolver::new();
    empty.add_endpoint(ENDPOINT);
    assert!(matches!(
        signed.verify(ENDPOINT, &empty).await,
        Err(EnvelopeError::KeyNotFound { .. })
    ));

    assert!(matches!(
        signed.verify("http://unreachable:1", &fixture_resolver()).await,
        Err(EnvelopeError::ResolutionUnavailable { .. })
    ));
}

#[tokio::test]
async fn each_key_type_signs_and_verifies() {
    for key_type in [KeyType::EcdsaP256, KeyType::EcdsaSecp256k1, KeyType::Ed25519] {
        let key = PrivateKey::generate(key_type).unwrap();
        let kid = did().key_id(&format!("keys-{key_type}")).unwrap();
        let resolver = resolver_with(kid.clone(), key.public_key().unwrap());

        let signed = fixture_request().sign(&kid, &key).unwrap();
        let header = Envelope::parse(&signed.serialize()).unwrap().header().clone();
        assert_eq!(header.alg, Some(key_type));

        let received = RequestMessage::deserialize(&signed.serialize()).unwrap();
        assert!(received.verify(ENDPOINT, &resolver).await.unwrap(), "{key_type}");
    }
}

#[test]
fn sm2_keys_are_recognised_but_unsupported() {
    let key = PrivateKey::from_bytes(KeyType::Sm2, &[9u8; 32]).unwrap();
    assert!(matches!(
        fixture_request().sign(&kid(), &key),
        Err(EnvelopeError::UnsupportedKeyType(KeyType::Sm2))
    ));
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

#[test]
fn wrong_segment_counts_are_rejected() {
    let four = format!("{UNSIGNED}.AAAA.AAAA");
    for bad in ["eyJ0eXAiOiJKV1QifQ", four.as_str(), "a.b.c.d.e.f"] {
        assert!(matches!(
            RequestMessage::deserialize(bad),
            Err(EnvelopeError::InvalidFormat(_))
        ));
    }
}

#[test]
fn non_json_segments_are_malformed() {
    let garbage = encode_segment(b"not json");
    let header = &UNSIGNED[..18];
    assert!(matches!(
        Envelope::parse(&format!("{header}.{garbage}")),
        Err(EnvelopeError::MalformedPayload(_))
    ));
    assert!(matches!(
        Envelope::parse(&format!("{garbage}.{}", &UNSIGNED[19..])),
        Err(EnvelopeError::MalformedPayload(_))
    ));
}

#[test]
fn invalid_issuer_is_rejected() {
    let header = encode_segment(br#"{"typ":"JWT"}"#);
    let claims = encode_segment(br#"{"jti":"1","iss":"nobody","iat":1}"#);
    assert!(matches!(
        Envelope::parse(&format!("{header}.{claims}")),
        Err(EnvelopeError::InvalidIdentifier(_))
    ));
}

#[test]
fn reserved_payload_fields_collide() {
    for reserved in ["jti", "iss", "sub", "iat", "exp"] {
        let mut payload = Map::new();
        payload.insert(reserved.to_string(), Value::from("x"));
        let result = Message::new(Metadata::new("1", did(), 1), payload);
        assert!(
            matches!(result, Err(EnvelopeError::FieldCollision(ref name)) if name == reserved),
            "{reserved}"
        );
    }
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_verifications_share_one_resolver() {
    let key = private_key();
    let resolver = Arc::new(CountingResolver {
        inner: fixture_resolver(),
        calls: AtomicUsize::new(0),
    });
    let good = Arc::new(fixture_request().sign(&kid(), &key).unwrap());
    let stranger = PrivateKey::generate(KeyType::EcdsaP256).unwrap();
    let bad = Arc::new(fixture_request().sign(&kid(), &stranger).unwrap());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let resolver = Arc::clone(&resolver);
            let message = if i % 2 == 0 { Arc::clone(&good) } else { Arc::clone(&bad) };
            tokio::spawn(async move { (i, message.verify(ENDPOINT, resolver.as_ref()).await) })
        })
        .collect();

    for joined in futures::future::join_all(tasks).await {
        let (i, result) = joined.unwrap();
        assert_eq!(result.unwrap(), i % 2 == 0);
    }
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 32);
}

#[tokio::test]
async fn dropped_verification_leaves_envelope_usable() {
    let signed = fixture_request().sign(&kid(), &private_key()).unwrap();
    let before = signed.serialize();

    let pending = tokio::time::timeout(
        Duration::from_millis(20),
        signed.verify(ENDPOINT, &PendingResolver),
    )
    .await;
    assert!(pending.is_err());

    assert_eq!(signed.serialize(), before);
    assert!(signed.verify(ENDPOINT, &fixture_resolver()).await.unwrap());
}
