use circuit_guard::BreakerBuilder;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::error::Error;
use std::fmt;
use std::time::Duration;

// Custom error type that implements Error trait
#[derive(Debug)]
struct BenchError(String);

impl BenchError {
    fn new(msg: &str) -> Self {
        BenchError(msg.to_string())
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Benchmark error: {}", self.0)
    }
}

impl Error for BenchError {}

async fn successful_operation(_: ()) -> Result<(), BenchError> {
    Ok(())
}

async fn failing_operation(_: ()) -> Result<(), BenchError> {
    Err(BenchError::new("Simulated failure"))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime")
}

fn bench_circuit_breaker_closed(c: &mut Criterion) {
    let rt = runtime();
    let breaker = BreakerBuilder::new()
        .cooldown(Duration::from_secs(30))
        .build(successful_operation);

    c.bench_function("circuit_breaker_closed_success", |b| {
        b.iter(|| black_box(rt.block_on(breaker.call(()))));
    });
}

fn bench_circuit_breaker_open_rejection(c: &mut Criterion) {
    let rt = runtime();
    let breaker = BreakerBuilder::new()
        .cooldown(Duration::from_secs(3600))
        .build(failing_operation);
    breaker.force_open();

    c.bench_function("circuit_breaker_open_rejection", |b| {
        b.iter(|| black_box(rt.block_on(breaker.call(()))));
    });
}

fn bench_circuit_breaker_transition(c: &mut Criterion) {
    let rt = runtime();
    let breaker = BreakerBuilder::new()
        .failure_threshold(5)
        .cooldown(Duration::from_secs(30))
        .build(failing_operation);

    c.bench_function("circuit_breaker_transition", |b| {
        b.iter_custom(|iters| {
            let start = std::time::Instant::now();

            for _ in 0..iters {
                // Force closed to ensure consistent starting point
                breaker.force_closed();

                // Make 5 failing calls to trip the breaker
                for _ in 0..5 {
                    let _ = black_box(rt.block_on(breaker.call(())));
                }
            }

            start.elapsed()
        });
    });
}

criterion_group!(
    benches,
    bench_circuit_breaker_closed,
    bench_circuit_breaker_open_rejection,
    bench_circuit_breaker_transition
);
criterion_main!(benches);
