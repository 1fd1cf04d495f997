use circuit_guard::{BreakerBuilder, BreakerError};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Custom error type that implements Error trait
#[derive(Debug)]
struct ServiceError(String);

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service error: {}", self.0)
    }
}

impl Error for ServiceError {}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // A downstream service that fails its first few requests, then hangs once, then recovers
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    let call_service = move |path: &'static str| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            match attempt {
                1..=3 => Err(ServiceError(format!("{} returned 500", path))),
                4 => {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    Ok(format!("{} answered too late", path))
                }
                _ => Ok(format!("{} answered on attempt {}", path, attempt)),
            }
        }
    };

    let breaker = BreakerBuilder::new()
        .failure_threshold(3) // Open after 3 consecutive failures
        .cooldown(Duration::from_secs(1)) // Stay open for 1 second before probing
        .call_timeout(Duration::from_millis(500)) // Give up on a single call after 500ms
        .build(call_service);

    println!("Circuit initial state: {}", breaker.current_state());

    for i in 1..=12 {
        println!("\nRequest {}: ", i);

        // Map breaker errors the way an HTTP front end would
        match breaker.call("/local/common").await {
            Ok(body) => println!("200 OK: {}", body),
            Err(err @ BreakerError::Open) | Err(err @ BreakerError::Timeout(_)) => {
                println!("503 Service Unavailable: {}", err);
            }
            Err(BreakerError::Operation(err)) => println!("503 Service Unavailable: {}", err),
        }

        println!(
            "Current state: {}, failures: {}",
            breaker.current_state(),
            breaker.failure_count()
        );

        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}
