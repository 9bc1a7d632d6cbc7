use chaum_blind_rsa::{KeyPair, Options};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

pub fn protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocol");
    let options = Options::default();
    let rng = &mut rand::thread_rng();
    let msg = b"This is a test message.";

    let key_sizes = [2048, 4096];
    for key_size in key_sizes {
        let kp = KeyPair::generate(rng, key_size, &options).unwrap();
        let (pk, sk) = (kp.pk, kp.sk);

        group.bench_function(BenchmarkId::new("blind", key_size), |b| {
            b.iter(|| {
                _ = pk.blind(&mut rand::thread_rng(), msg, &options).unwrap();
            })
        });

        let blinding_result = pk.blind(rng, msg, &options).unwrap();

        group.bench_function(BenchmarkId::new("blind_sign", key_size), |b| {
            b.iter(|| {
                _ = sk
                    .blind_sign(&mut rand::thread_rng(), &blinding_result.blind_msg, &options)
                    .unwrap();
            })
        });

        let blind_sig = sk
            .blind_sign(rng, &blinding_result.blind_msg, &options)
            .unwrap();

        group.bench_function(BenchmarkId::new("sign_and_finalize", key_size), |b| {
            b.iter_batched(
                || pk.blind(&mut rand::thread_rng(), msg, &options).unwrap(),
                |result| {
                    let blind_sig = sk
                        .blind_sign(&mut rand::thread_rng(), &result.blind_msg, &options)
                        .unwrap();
                    _ = pk.finalize(&blind_sig, result, msg, &options).unwrap();
                },
                criterion::BatchSize::SmallInput,
            )
        });

        let sig = pk
            .finalize(&blind_sig, blinding_result, msg, &options)
            .unwrap();

        group.bench_function(BenchmarkId::new("verify", key_size), |b| {
            b.iter(|| {
                assert!(pk.verify(&sig, msg, &options).unwrap());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, protocol);
criterion_main!(benches);
