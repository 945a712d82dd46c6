//! Benchmarks for rule ingestion and host classification.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dnssieve::Engine;

/// Build an engine loaded with a synthetic filter list.
fn engine_with_rules(count: usize) -> Engine {
    let engine = Engine::new();
    for i in 0..count {
        let rule = match i % 4 {
            0 => format!("||domain{}.example.com^", i),
            1 => format!("block{}*.example.net^", i),
            2 => format!("@@||allow{}.example.com^", i),
            _ => format!("|start{}.example.org", i),
        };
        engine.add_rule(&rule, 0).unwrap();
    }
    // Force the combined matcher build out of the measured path.
    let _ = engine.check_host("warmup.example.com");
    engine
}

fn bench_add_rule(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_rule");

    group.bench_function("domain_anchor", |b| {
        let engine = Engine::new();
        b.iter(|| engine.add_rule(black_box("||doubleclick.net^"), 0))
    });

    group.bench_function("mask", |b| {
        let engine = Engine::new();
        b.iter(|| engine.add_rule(black_box("test*.example.org^"), 0))
    });

    group.finish();
}

fn bench_check_host(c: &mut Criterion) {
    let engine = engine_with_rules(12_000);

    let mut group = c.benchmark_group("check_host");

    group.bench_function("no_match", |b| {
        b.iter(|| {
            black_box(engine.check_host(
                "asdasdasd_adsajdasda_asdasdjashdkasdasdasdasd.thisistesthost.com",
            ))
        })
    });

    group.bench_function("block_match", |b| {
        b.iter(|| black_box(engine.check_host("ads.domain5000.example.com")))
    });

    group.bench_function("allow_match", |b| {
        b.iter(|| black_box(engine.check_host("allow4002.example.com")))
    });

    group.finish();
}

fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for size in [100, 1_000, 10_000].iter() {
        let engine = engine_with_rules(*size);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("rules", size), size, |b, _| {
            b.iter(|| black_box(engine.check_host("nomatch.thisistesthost.com")))
        });
    }

    group.finish();
}

fn bench_concurrent_check(c: &mut Criterion) {
    use std::sync::Arc;

    let engine = Arc::new(engine_with_rules(10_000));
    let hosts: Vec<String> = (0..100)
        .map(|i| format!("ads.domain{}.example.com", i * 100))
        .collect();

    let mut group = c.benchmark_group("concurrent_check");
    group.throughput(Throughput::Elements(hosts.len() as u64));

    group.bench_function("single_thread", |b| {
        b.iter(|| {
            for host in &hosts {
                black_box(engine.check_host(host));
            }
        })
    });

    group.finish();
}

fn bench_safe_search(c: &mut Criterion) {
    let engine = Engine::new();
    engine.enable_safe_search();

    let mut group = c.benchmark_group("safe_search");

    group.bench_function("hit", |b| {
        b.iter(|| black_box(engine.safe_search_domain("www.google.com")))
    });

    group.bench_function("miss", |b| {
        b.iter(|| black_box(engine.safe_search_domain("www.example.org")))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_add_rule,
    bench_check_host,
    bench_scalability,
    bench_concurrent_check,
    bench_safe_search,
);

criterion_main!(benches);
