//! # circuit-guard
//!
//! An async circuit breaker that guards a single downstream operation and
//! bounds every call with a timeout.
//!
//! ## What is a Circuit Breaker?
//!
//! The Circuit Breaker pattern stops a caller from hammering an operation
//! that keeps failing or hanging. The breaker operates in three states:
//!
//! - **Closed**: Normal operation. Calls pass through to the operation.
//! - **Open**: Calls are rejected immediately without invoking the operation.
//! - **Half-Open**: Once the cooldown has elapsed, calls are let through to
//!   probe whether the operation has recovered.
//!
//! A run of `failure_threshold` consecutive failures (operation errors or
//! timeouts) opens the circuit for `cooldown`. Any success closes it again and
//! clears the failure count.
//!
//! ## Basic Usage
//!
//! ```rust
//! use circuit_guard::{BreakerBuilder, BreakerError};
//! use std::time::Duration;
//!
//! async fn fetch(id: u32) -> Result<String, std::io::Error> {
//!     Ok(format!("record {}", id))
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let breaker = BreakerBuilder::new()
//!     .failure_threshold(3)
//!     .cooldown(Duration::from_secs(10))
//!     .call_timeout(Duration::from_secs(5))
//!     .build(fetch);
//!
//! match breaker.call(7).await {
//!     Ok(record) => println!("got {}", record),
//!     Err(BreakerError::Open) => println!("circuit is open, call was prevented"),
//!     Err(BreakerError::Timeout(limit)) => println!("no answer within {:?}", limit),
//!     Err(BreakerError::Operation(err)) => println!("call failed: {}", err),
//! }
//! # }
//! ```
//!
//! Operations taking several arguments receive them as a tuple; operations
//! taking none are called with `()`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod breaker;
mod config;
mod error;
mod hook;
pub mod prelude;
mod state;

// Re-exports
pub use breaker::CircuitBreaker;
pub use config::{
    BreakerBuilder, BreakerConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_COOLDOWN,
    DEFAULT_FAILURE_THRESHOLD,
};
pub use error::{BreakerError, BreakerResult};
pub use hook::HookRegistry;
pub use state::{Circuit, State};
