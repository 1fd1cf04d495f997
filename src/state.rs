//! Circuit breaker state machine implementation.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use tokio::time::Instant;

// About 30 years; used when `now + cooldown` overflows.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Represents the possible states of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Circuit is closed and calls pass through.
    Closed,

    /// Circuit is open and calls are rejected until the cooldown elapses.
    Open,

    /// Cooldown has elapsed and calls are let through to probe recovery.
    HalfOpen,
}

impl State {
    /// Lowercase label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Closed or half-open; the call proceeds.
    Allowed,
    /// The circuit just moved from open to half-open; the call is the probe.
    Probe,
    /// Open with the cooldown still running.
    Rejected,
}

/// A state change written by one of the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) from: State,
    pub(crate) to: State,
}

impl Transition {
    pub(crate) fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// Snapshot of a breaker's mutable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circuit {
    state: State,
    failure_count: u32,
    next_attempt: Instant,
}

impl Circuit {
    /// Creates a closed circuit with no recorded failures.
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            state: State::Closed,
            failure_count: 0,
            next_attempt: now,
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Consecutive failures since the last success or reset.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Earliest moment an open circuit lets a probe through.
    ///
    /// Only meaningful while the circuit is open; it keeps the last deadline otherwise.
    pub fn next_attempt(&self) -> Instant {
        self.next_attempt
    }

    /// Decides whether a call may proceed, moving open to half-open once `now`
    /// is strictly past the deadline.
    pub(crate) fn admit(&mut self, now: Instant) -> Admission {
        match self.state {
            State::Open if now > self.next_attempt => {
                self.state = State::HalfOpen;
                Admission::Probe
            }
            State::Open => Admission::Rejected,
            State::Closed | State::HalfOpen => Admission::Allowed,
        }
    }

    /// Success handler: clears the counter and closes the circuit.
    pub(crate) fn record_success(&mut self) -> Transition {
        self.reset()
    }

    /// Closes the circuit and clears the counter.
    pub(crate) fn reset(&mut self) -> Transition {
        let from = self.state;
        self.failure_count = 0;
        self.state = State::Closed;
        Transition {
            from,
            to: State::Closed,
        }
    }

    /// Failure handler: counts the failure and opens the circuit once the
    /// threshold is reached, whatever the prior state.
    ///
    /// A half-open circuit whose counter was never reset re-opens on its first
    /// failed probe.
    pub(crate) fn record_failure(
        &mut self,
        now: Instant,
        threshold: u32,
        cooldown: Duration,
    ) -> Option<Transition> {
        self.failure_count = self.failure_count.saturating_add(1);
        if self.failure_count >= threshold {
            Some(self.trip(now, cooldown))
        } else {
            None
        }
    }

    /// Opens the circuit with a deadline `cooldown` after `now`.
    ///
    /// A cooldown too large to represent is capped to a far-future deadline.
    pub(crate) fn trip(&mut self, now: Instant, cooldown: Duration) -> Transition {
        let next_attempt = now
            .checked_add(cooldown)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        let from = self.state;
        self.next_attempt = next_attempt;
        self.state = State::Open;
        Transition {
            from,
            to: State::Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(10);

    #[test]
    fn opens_after_threshold_failures() {
        let start = Instant::now();
        let mut circuit = Circuit::new(start);

        assert_eq!(circuit.record_failure(start, 3, COOLDOWN), None);
        assert_eq!(circuit.record_failure(start, 3, COOLDOWN), None);
        assert_eq!(circuit.state(), State::Closed);

        let transition = circuit.record_failure(start, 3, COOLDOWN).unwrap();
        assert_eq!(transition.from, State::Closed);
        assert_eq!(transition.to, State::Open);
        assert_eq!(circuit.failure_count(), 3);
        assert_eq!(circuit.next_attempt(), start + COOLDOWN);
    }

    #[test]
    fn rejects_until_strictly_past_deadline() {
        let start = Instant::now();
        let mut circuit = Circuit::new(start);
        circuit.trip(start, COOLDOWN);

        assert_eq!(circuit.admit(start), Admission::Rejected);
        assert_eq!(circuit.admit(start + COOLDOWN), Admission::Rejected);
        assert_eq!(circuit.state(), State::Open);

        let later = start + COOLDOWN + Duration::from_millis(1);
        assert_eq!(circuit.admit(later), Admission::Probe);
        assert_eq!(circuit.state(), State::HalfOpen);
        assert_eq!(circuit.admit(later), Admission::Allowed);
    }

    #[test]
    fn half_open_failure_below_threshold_stays_half_open() {
        let start = Instant::now();
        let mut circuit = Circuit::new(start);
        circuit.trip(start, COOLDOWN);
        circuit.admit(start + COOLDOWN * 2);

        assert_eq!(circuit.record_failure(start, 3, COOLDOWN), None);
        assert_eq!(circuit.state(), State::HalfOpen);
        assert_eq!(circuit.failure_count(), 1);
    }

    #[test]
    fn success_resets_from_any_state() {
        let start = Instant::now();
        for threshold in [1, 2] {
            let mut circuit = Circuit::new(start);
            circuit.record_failure(start, threshold, COOLDOWN);

            let transition = circuit.record_success();
            assert_eq!(transition.to, State::Closed);
            assert_eq!(circuit.state(), State::Closed);
            assert_eq!(circuit.failure_count(), 0);
        }
    }

    #[test]
    fn failure_count_saturates() {
        let start = Instant::now();
        let mut circuit = Circuit::new(start);
        circuit.failure_count = u32::MAX;

        assert!(circuit.record_failure(start, 3, COOLDOWN).is_some());
        assert_eq!(circuit.failure_count(), u32::MAX);
    }

    #[test]
    fn unrepresentable_cooldown_is_capped() {
        let start = Instant::now();
        let mut circuit = Circuit::new(start);

        let transition = circuit.record_failure(start, 1, Duration::MAX).unwrap();
        assert_eq!(transition.to, State::Open);
        assert_eq!(circuit.next_attempt(), start + FAR_FUTURE);
        assert_eq!(circuit.admit(start + Duration::from_secs(86400)), Admission::Rejected);
    }

    #[test]
    fn reset_closes_and_clears_counter() {
        let start = Instant::now();
        let mut circuit = Circuit::new(start);
        circuit.record_failure(start, 1, COOLDOWN);

        let transition = circuit.reset();
        assert_eq!(transition.from, State::Open);
        assert_eq!(circuit.state(), State::Closed);
        assert_eq!(circuit.failure_count(), 0);
    }

    #[test]
    fn labels() {
        assert_eq!(State::HalfOpen.to_string(), "half-open");
        assert_eq!(State::Closed.as_str(), "closed");
        assert_eq!(State::Open.as_str(), "open");
    }
}
