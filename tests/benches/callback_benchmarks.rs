//! # Callback Benchmarks
//!
//! | Group | Operation |
//! |-------|-----------|
//! | signature | sorted SHA-1 over 3 and 4 inputs |
//! | envelope | encrypt / decrypt by message size |
//! | handshake | full encrypted verification through the controller |

use callback_gateway::{CallbackGatewayService, EncryptedQuery};
use callback_tests::fixtures::{gateway_config, PlatformSimulator, TIMESTAMP};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::RngCore;

fn bench_signature(c: &mut Criterion) {
    let sim = PlatformSimulator::default();
    let verifier = sim.verifier();
    let echostr = sim.encrypt("4913205871923845");
    let signature = verifier.sign(TIMESTAMP, "nonce", Some(&echostr));

    let mut group = c.benchmark_group("signature");

    group.bench_function("sign_plain", |b| {
        b.iter(|| black_box(verifier.sign(black_box(TIMESTAMP), black_box("nonce"), None)))
    });

    group.bench_function("verify_encrypted", |b| {
        b.iter(|| {
            black_box(verifier.verify(
                black_box(&signature),
                TIMESTAMP,
                "nonce",
                Some(&echostr),
            ))
        })
    });

    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let sim = PlatformSimulator::default();
    let cipher = sim.cipher();

    let mut group = c.benchmark_group("envelope");

    for size in [16usize, 256, 2048, 16384] {
        let mut message = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut message);
        let sealed = cipher.encrypt(&message, "corp-bench").unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encrypt", size), &message, |b, msg| {
            b.iter(|| black_box(cipher.encrypt(msg, "corp-bench").unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &sealed, |b, sealed| {
            b.iter(|| black_box(cipher.decrypt(sealed).unwrap()))
        });
    }

    group.finish();
}

fn bench_handshake(c: &mut Criterion) {
    let sim = PlatformSimulator::default();
    let controller = CallbackGatewayService::new(gateway_config())
        .unwrap()
        .controller();

    let echostr = sim.encrypt("4913205871923845");
    let query = EncryptedQuery {
        msg_signature: Some(sim.verifier().sign(TIMESTAMP, "nonce", Some(&echostr))),
        timestamp: Some(TIMESTAMP.to_string()),
        nonce: Some("nonce".to_string()),
        echostr: Some(echostr),
    };

    c.bench_function("handshake/encrypted_verify", |b| {
        b.iter(|| black_box(controller.verify_encrypted(black_box(&query)).unwrap()))
    });
}

criterion_group!(benches, bench_signature, bench_envelope, bench_handshake);
criterion_main!(benches);
