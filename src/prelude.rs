//! Re-exports common types for convenient usage.
//!
//! # Example
//! ```rust,no_run
//! use circuit_guard::prelude::*;
//! ```

pub use crate::{BreakerBuilder, BreakerError, BreakerResult, CircuitBreaker, State};
