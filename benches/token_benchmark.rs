use criterion::{criterion_group, criterion_main, Criterion};
use natty_fit::services::token::{Identity, TokenService};
use std::hint::black_box;

fn benchmark_tokens(c: &mut Criterion) {
    let service = TokenService::new(b"bench_jwt_key_32_bytes_minimum!!");
    let identity = Identity {
        id: "0b5c7d2e-6a1f-4f0e-9d55-3c8f2b1a7e90".to_string(),
        email: "alice@example.com".to_string(),
        role: None,
    };
    let now = 1_767_225_600;
    let issued = service
        .issue_at(&identity, now)
        .expect("Failed to issue token");

    let mut group = c.benchmark_group("session_tokens");

    group.bench_function("issue", |b| {
        b.iter(|| service.issue_at(black_box(&identity), now))
    });

    group.bench_function("verify", |b| {
        b.iter(|| service.verify_at(black_box(&issued.token), now + 60))
    });

    group.finish();
}

criterion_group!(benches, benchmark_tokens);
criterion_main!(benches);
