use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use restgate::{
    AdmissionGate, ClientIdentity, ClientKeyResolver, FixedWindowCounter, RateLimitPolicy,
    ShardedStorage,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

fn counter(limit: u64) -> FixedWindowCounter<restgate::CounterStorage> {
    let policy = RateLimitPolicy::new(limit, 60).unwrap();
    FixedWindowCounter::new(Arc::new(ShardedStorage::new()), &policy).unwrap()
}

/// Benchmark identity resolution from HTTP requests
fn bench_identity_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("identity_resolution");
    let resolver = ClientKeyResolver::default();

    let forwarded = http::Request::builder()
        .header("X-Forwarded-For", "203.0.113.5, 10.0.0.1, 10.0.0.2")
        .body(())
        .unwrap();
    group.bench_function("forwarded_header", |b| {
        b.iter(|| black_box(resolver.resolve(black_box(&forwarded))))
    });

    let mut direct = http::Request::builder().body(()).unwrap();
    let peer: SocketAddr = "192.0.2.1:40000".parse().unwrap();
    direct.extensions_mut().insert(peer);
    group.bench_function("peer_address", |b| {
        b.iter(|| black_box(resolver.resolve(black_box(&direct))))
    });

    group.finish();
}

/// Benchmark single-threaded admission throughput
fn bench_single_threaded_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded");
    group.throughput(Throughput::Elements(1000));

    for clients in [1usize, 10, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("clients", clients), clients, |b, &clients| {
            let counter = counter(u64::MAX);
            let ids: Vec<_> = (0..clients)
                .map(|i| ClientIdentity::new(format!("10.0.{}.{}", i / 256, i % 256)))
                .collect();
            let now = Instant::now();

            b.iter(|| {
                for i in 0..1000 {
                    let id = ids[i % clients].clone();
                    black_box(counter.check_and_increment(black_box(id), now));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark multi-threaded throughput on one hot identity and on distinct ones
fn bench_concurrent_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        for shared in [true, false] {
            let name = if shared { "same_client" } else { "distinct_clients" };
            group.bench_with_input(
                BenchmarkId::new(name, num_threads),
                num_threads,
                |b, &num_threads| {
                    b.iter(|| {
                        let counter = Arc::new(counter(u64::MAX));
                        let now = Instant::now();
                        let handles: Vec<_> = (0..num_threads)
                            .map(|t| {
                                let counter = Arc::clone(&counter);
                                std::thread::spawn(move || {
                                    let id = if shared {
                                        ClientIdentity::new("203.0.113.5")
                                    } else {
                                        ClientIdentity::new(format!("10.0.0.{}", t))
                                    };
                                    for _ in 0..1000 {
                                        black_box(counter.check_and_increment(id.clone(), now));
                                    }
                                })
                            })
                            .collect();

                        for handle in handles {
                            handle.join().unwrap();
                        }
                    })
                },
            );
        }
    }

    group.finish();
}

/// Benchmark the full gate including capacity eviction
fn bench_gate_with_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_capacity");

    for max_clients in [100usize, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("max_clients", max_clients),
            max_clients,
            |b, &max_clients| {
                let gate = AdmissionGate::builder()
                    .with_max_clients(max_clients)
                    .build()
                    .unwrap();
                let requests: Vec<_> = (0..1000)
                    .map(|i| {
                        http::Request::builder()
                            .header("X-Forwarded-For", format!("10.1.{}.{}", i / 256, i % 256))
                            .body(())
                            .unwrap()
                    })
                    .collect();

                b.iter(|| {
                    for req in &requests {
                        black_box(gate.admit_now(req));
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_identity_resolution,
    bench_single_threaded_throughput,
    bench_concurrent_throughput,
    bench_gate_with_eviction,
);
criterion_main!(benches);
