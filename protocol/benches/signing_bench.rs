// Envelope benchmarks.
//
// Canonical encoding, parsing, and sign/verify per key type, plus envelope
// verification with payloads of growing size.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Map, Value};

use vericlaim_protocol::claims::{canonical, Metadata, Request};
use vericlaim_protocol::crypto::{sign, verify, KeyType, PrivateKey};
use vericlaim_protocol::envelope::{Envelope, RequestMessage};
use vericlaim_protocol::identity::Identifier;

const DID: &str = "did:ont:TGpoKGo26xmnA1imgLwLvYH2nhWnN62G9w";

fn metadata() -> Metadata {
    let did = Identifier::parse(DID).unwrap();
    Metadata::new("1", did.clone(), 1525800823).with_subject(did)
}

fn payload(fields: usize) -> Map<String, Value> {
    (0..fields)
        .map(|i| (format!("field-{i:04}"), json!({"index": i, "tags": ["a", "b"]})))
        .collect()
}

fn bench_canonical_encode(c: &mut Criterion) {
    let value = Value::Object(payload(64));
    c.bench_function("canonical/encode_64_fields", |b| {
        b.iter(|| canonical::encode(&value).unwrap());
    });
}

fn bench_parse(c: &mut Criterion) {
    let serialized = RequestMessage::new(metadata(), Request::new(json!({"email": "request@email.com"})))
        .unwrap()
        .serialize();
    c.bench_function("envelope/parse_request", |b| {
        b.iter(|| Envelope::parse(&serialized).unwrap());
    });
}

fn bench_sign_verify(c: &mut Criterion) {
    let message = b"eyJ0eXAiOiJKV1QifQ.eyJqdGkiOiIxIn0";

    for key_type in [KeyType::EcdsaP256, KeyType::EcdsaSecp256k1, KeyType::Ed25519] {
        let key = PrivateKey::generate(key_type).unwrap();
        let public_key = key.public_key().unwrap();
        let signature = sign(message, &key).unwrap();

        c.bench_function(&format!("{key_type}/sign"), |b| {
            b.iter(|| sign(message, &key).unwrap());
        });
        c.bench_function(&format!("{key_type}/verify"), |b| {
            b.iter(|| verify(message, &signature, &public_key));
        });
    }
}

fn bench_verify_by_payload_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope/verify_with");
    let key = PrivateKey::generate(KeyType::EcdsaP256).unwrap();
    let public_key = key.public_key().unwrap();
    let kid = Identifier::parse(DID).unwrap().key_id("keys-1").unwrap();

    for fields in [1, 16, 128] {
        let envelope = Envelope::build_unsigned(&metadata(), &payload(fields))
            .unwrap()
            .sign(&kid, &key)
            .unwrap();

        group.throughput(Throughput::Bytes(envelope.serialize().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fields), &envelope, |b, envelope| {
            b.iter(|| assert!(envelope.verify_with(&public_key)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_canonical_encode,
    bench_parse,
    bench_sign_verify,
    bench_verify_by_payload_size
);
criterion_main!(benches);
