//! Core circuit breaker implementation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::error::{BreakerError, BreakerResult};
use crate::hook::HookRegistry;
use crate::state::{Admission, Circuit, State, Transition};

/// Inner state of the circuit breaker, shared between clones.
struct BreakerInner<F> {
    operation: F,
    config: BreakerConfig,
    circuit: Mutex<Circuit>,
    hooks: Arc<HookRegistry>,
}

/// A circuit breaker guarding one asynchronous operation.
///
/// Every [`call`](Self::call) consults the circuit, runs the operation under
/// the configured timeout and feeds the outcome back into the state machine.
/// Clones share the same circuit.
///
/// Concurrent calls are not serialized against each other. Each state update
/// is atomic, but several callers arriving after the cooldown may all be let
/// through as probes, and outcomes are applied in the order they resolve.
pub struct CircuitBreaker<F> {
    inner: Arc<BreakerInner<F>>,
}

impl<F> CircuitBreaker<F> {
    /// Creates a circuit breaker with default settings.
    pub fn new(operation: F) -> Self {
        Self::with_config(operation, BreakerConfig::default())
    }

    /// Creates a circuit breaker with the given settings.
    pub fn with_config(operation: F, config: BreakerConfig) -> Self {
        Self::from_parts(operation, config, Arc::new(HookRegistry::new()))
    }

    pub(crate) fn from_parts(
        operation: F,
        config: BreakerConfig,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        let inner = BreakerInner {
            operation,
            config: config.normalized(),
            circuit: Mutex::new(Circuit::new(Instant::now())),
            hooks,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Settings this breaker was built with.
    pub fn config(&self) -> &BreakerConfig {
        &self.inner.config
    }

    /// Gets the current state of the circuit breaker.
    pub fn current_state(&self) -> State {
        self.inner.circuit.lock().state()
    }

    /// Consecutive failures since the last success.
    pub fn failure_count(&self) -> u32 {
        self.inner.circuit.lock().failure_count()
    }

    /// Earliest moment an open circuit lets a probe through.
    pub fn next_attempt(&self) -> Instant {
        self.inner.circuit.lock().next_attempt()
    }

    /// Consistent snapshot of state, failure count and deadline.
    pub fn status(&self) -> Circuit {
        *self.inner.circuit.lock()
    }

    /// Invokes the operation with `args` if the circuit allows it.
    ///
    /// Fails with [`BreakerError::Open`] without invoking the operation while
    /// the circuit is open and the cooldown has not elapsed. Otherwise races
    /// the operation against the call timeout: a late operation is dropped and
    /// reported as [`BreakerError::Timeout`], an operation error is returned
    /// as [`BreakerError::Operation`]. Timeouts and operation errors both count
    /// as failures.
    pub async fn call<A, Fut, T, E>(&self, args: A) -> BreakerResult<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.pre_call()?;

        let limit = self.inner.config.call_timeout;
        match tokio::time::timeout(limit, (self.inner.operation)(args)).await {
            Ok(Ok(value)) => {
                self.on_success();
                Ok(value)
            }
            Ok(Err(err)) => {
                self.on_failure();
                Err(BreakerError::Operation(err))
            }
            Err(_) => {
                tracing::warn!(timeout = ?limit, "guarded call timed out");
                self.on_failure();
                Err(BreakerError::Timeout(limit))
            }
        }
    }

    /// Checks if a call is allowed, moving an expired open circuit to half-open.
    fn pre_call<E>(&self) -> BreakerResult<(), E> {
        let now = Instant::now();
        let (before, admission) = {
            let mut circuit = self.inner.circuit.lock();
            let before = *circuit;
            (before, circuit.admit(now))
        };

        tracing::debug!(
            state = %before.state(),
            failure_count = before.failure_count(),
            next_attempt = ?before.next_attempt(),
            "guarded call"
        );

        match admission {
            Admission::Allowed => Ok(()),
            Admission::Probe => {
                tracing::info!("cooldown elapsed, circuit half-open");
                self.inner
                    .hooks
                    .execute_state_transition_hook(State::HalfOpen);
                Ok(())
            }
            Admission::Rejected => {
                tracing::debug!(
                    retry_in = ?before.next_attempt().saturating_duration_since(now),
                    "circuit open, call rejected"
                );
                self.inner.hooks.execute_rejected_hook();
                Err(BreakerError::Open)
            }
        }
    }

    fn on_success(&self) {
        let transition = self.inner.circuit.lock().record_success();

        self.inner.hooks.execute_success_hook();
        if transition.is_change() {
            self.report(transition);
        }
    }

    fn on_failure(&self) {
        let config = &self.inner.config;
        let (failure_count, transition) = {
            let mut circuit = self.inner.circuit.lock();
            let transition =
                circuit.record_failure(Instant::now(), config.failure_threshold, config.cooldown);
            (circuit.failure_count(), transition)
        };

        self.inner.hooks.execute_failure_hook();
        match transition {
            Some(transition) if transition.is_change() => {
                tracing::warn!(
                    from = %transition.from,
                    failure_count,
                    cooldown = ?config.cooldown,
                    "circuit opened"
                );
                self.inner.hooks.execute_state_transition_hook(State::Open);
            }
            Some(_) => {
                tracing::debug!(
                    failure_count,
                    cooldown = ?config.cooldown,
                    "failure while open, deadline re-armed"
                );
            }
            None => {
                tracing::debug!(
                    failure_count,
                    threshold = config.failure_threshold,
                    "failure recorded"
                );
            }
        }
    }

    /// Forces the circuit open with a fresh cooldown.
    ///
    /// Returns false if it was already open.
    pub fn force_open(&self) -> bool {
        let transition = {
            let mut circuit = self.inner.circuit.lock();
            if circuit.state() == State::Open {
                return false;
            }
            circuit.trip(Instant::now(), self.inner.config.cooldown)
        };

        tracing::warn!(from = %transition.from, "circuit forced open");
        self.inner.hooks.execute_state_transition_hook(State::Open);
        true
    }

    /// Forces the circuit closed and clears the failure count.
    ///
    /// Returns false if it was already closed.
    pub fn force_closed(&self) -> bool {
        let transition = {
            let mut circuit = self.inner.circuit.lock();
            if circuit.state() == State::Closed {
                return false;
            }
            circuit.reset()
        };

        self.report(transition);
        true
    }

    fn report(&self, transition: Transition) {
        tracing::info!(from = %transition.from, to = %transition.to, "circuit state changed");
        self.inner
            .hooks
            .execute_state_transition_hook(transition.to);
    }

    /// Time left before an open circuit admits a probe, or zero if calls are admitted.
    pub fn remaining_cooldown(&self) -> Duration {
        let circuit = self.status();
        match circuit.state() {
            State::Open => circuit
                .next_attempt()
                .saturating_duration_since(Instant::now()),
            State::Closed | State::HalfOpen => Duration::ZERO,
        }
    }
}

// Cheap because inner state is Arc'd
impl<F> Clone for CircuitBreaker<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> fmt::Debug for CircuitBreaker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.inner.config)
            .field("circuit", &self.status())
            .finish_non_exhaustive()
    }
}
