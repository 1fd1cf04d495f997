//! Configuration for circuit breakers.

use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::hook::HookRegistry;

/// Consecutive failures that open the circuit by default.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// How long an opened circuit rejects calls by default.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Maximum duration of one call to the operation by default.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed settings of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Number of consecutive failures required to open the circuit.
    pub failure_threshold: u32,

    /// How long the circuit stays open before a probe is allowed.
    pub cooldown: Duration,

    /// Maximum time allowed for one invocation of the operation.
    pub call_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl BreakerConfig {
    /// Replaces a zero failure threshold with the default one.
    pub(crate) fn normalized(mut self) -> Self {
        if self.failure_threshold == 0 {
            tracing::warn!(
                default = DEFAULT_FAILURE_THRESHOLD,
                "failure threshold of zero is not allowed, using the default"
            );
            self.failure_threshold = DEFAULT_FAILURE_THRESHOLD;
        }
        self
    }
}

/// Builder for creating circuit breakers with custom configurations.
#[derive(Default)]
pub struct BreakerBuilder {
    config: BreakerConfig,
    hook_registry: Option<Arc<HookRegistry>>,
}

impl BreakerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of consecutive failures that opens the circuit.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Sets the cooldown duration before an open circuit lets a probe through.
    pub fn cooldown(mut self, duration: Duration) -> Self {
        self.config.cooldown = duration;
        self
    }

    /// Sets the maximum duration of a single call.
    pub fn call_timeout(mut self, duration: Duration) -> Self {
        self.config.call_timeout = duration;
        self
    }

    /// Replaces all settings at once.
    pub fn config(mut self, config: BreakerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets a hook registry for the circuit breaker.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hook_registry = Some(Arc::new(hooks));
        self
    }

    /// Builds a circuit breaker guarding `operation`.
    pub fn build<F>(self, operation: F) -> CircuitBreaker<F> {
        let hooks = self.hook_registry.unwrap_or_default();
        CircuitBreaker::from_parts(operation, self.config, hooks)
    }
}
