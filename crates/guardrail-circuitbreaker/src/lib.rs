//! Circuit breaker for async operations against a failing dependency.
//!
//! The breaker is a three-state machine. While `Closed`, calls flow through
//! and consecutive failures are counted; reaching the failure threshold opens
//! the circuit. While `Open`, calls are rejected without invoking the
//! operation until the configured cooldown elapses, after which a single
//! probe is admitted (`HalfOpen`). Enough consecutive probe successes close
//! the circuit again; one probe failure reopens it.
//!
//! One breaker instance is shared by every caller of a logical downstream
//! dependency, and all of its state lives behind a single mutex so concurrent
//! callers observe consistent transitions.
//!
//! # Examples
//!
//! ```
//! use guardrail_circuitbreaker::{CircuitBreaker, CircuitState};
//! use std::time::Duration;
//!
//! # #[derive(Debug, Clone)]
//! # struct UpstreamError;
//! # async fn example() {
//! let breaker = CircuitBreaker::builder()
//!     .failure_threshold(3)
//!     .success_threshold(2)
//!     .open_timeout(Duration::from_secs(10))
//!     .name("payments-api")
//!     .on_state_transition(|from, to| {
//!         println!("payments-api breaker: {:?} -> {:?}", from, to);
//!     })
//!     .build();
//!
//! let result = breaker
//!     .execute(|| async { Ok::<_, UpstreamError>("response") })
//!     .await;
//! assert!(result.is_ok());
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! # }
//! ```

mod circuit;
mod config;
mod error;
mod events;

pub use circuit::{CircuitState, CircuitStats};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;

use circuit::Circuit;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A shared, thread-safe circuit breaker.
///
/// `allow_request` / `record_success` / `record_failure` are exposed for
/// callers that manage the operation invocation themselves; pair every
/// admitted `allow_request` with exactly one recorded outcome, or use
/// [`execute`](CircuitBreaker::execute) which does both. An admitted probe
/// whose outcome is never recorded (the caller was cancelled or hung up)
/// only blocks further probes for one `open_timeout`, after which the next
/// request is admitted as a fresh probe.
pub struct CircuitBreaker {
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<CircuitBreakerConfig>,
}

impl CircuitBreaker {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    pub(crate) fn new(config: CircuitBreakerConfig) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Mutex::new(Circuit::new_with_atomic(Arc::clone(&state_atomic))),
            state_atomic,
            config: Arc::new(config),
        }
    }

    // A poisoned mutex only means another caller panicked mid-update; the
    // state machine itself is always left consistent, so recover the guard.
    fn circuit(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now_ms(&self) -> u64 {
        self.config.clock.now_ms()
    }

    /// Asks the breaker whether a call may proceed right now.
    ///
    /// While open, this performs the open → half-open transition once the
    /// cooldown has elapsed and admits exactly one probe, even under racing
    /// callers.
    pub fn allow_request(&self) -> bool {
        let now = self.now_ms();
        self.circuit().try_acquire(&self.config, now)
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let now = self.now_ms();
        self.circuit().record_success(&self.config, now);
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let now = self.now_ms();
        self.circuit().record_failure(&self.config, now);
    }

    /// Forces the breaker closed and zeroes all counters, from any state.
    pub fn reset(&self) {
        let now = self.now_ms();
        self.circuit().reset(&self.config, now);
    }

    /// Current state, read without taking the lock.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// Consistent snapshot of the state and counters.
    pub fn stats(&self) -> CircuitStats {
        self.circuit().stats()
    }

    /// Runs `op` through the breaker.
    ///
    /// Fails fast with [`CircuitBreakerError::OpenCircuit`] without invoking
    /// `op` when the call is not permitted; otherwise invokes `op`, records
    /// the outcome, and passes the operation's own result through unchanged.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.allow_request() {
            return Err(CircuitBreakerError::OpenCircuit);
        }

        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => {
                self.record_failure();
                Err(CircuitBreakerError::Operation(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrail_core::clock::{ManualClock, SharedClock};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError;

    fn breaker_with_clock(
        failure_threshold: u32,
        success_threshold: u32,
        open_timeout_ms: u64,
    ) -> (CircuitBreaker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let breaker = CircuitBreaker::builder()
            .failure_threshold(failure_threshold)
            .success_threshold(success_threshold)
            .open_timeout(Duration::from_millis(open_timeout_ms))
            .clock(Arc::clone(&clock) as SharedClock)
            .name("test")
            .build();
        (breaker, clock)
    }

    #[test]
    fn opens_after_consecutive_failures() {
        let (breaker, _clock) = breaker_with_clock(2, 1, 1000);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn success_resets_the_failure_streak() {
        let (breaker, _clock) = breaker_with_clock(2, 1, 1000);

        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().consecutive_failures, 1);
    }

    #[test]
    fn rejects_while_open_until_timeout_elapses() {
        let (breaker, clock) = breaker_with_clock(1, 1, 1000);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.stats().opened_at_ms, Some(0));

        assert!(!breaker.allow_request());
        clock.advance_ms(999);
        assert!(!breaker.allow_request());

        clock.advance_ms(1);
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_admits_one_probe_at_a_time() {
        let (breaker, clock) = breaker_with_clock(1, 2, 100);

        breaker.record_failure();
        clock.advance_ms(100);

        // First caller wins the transition and the probe slot.
        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());

        // After the probe reports back, another probe is admitted.
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.allow_request());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let (breaker, clock) = breaker_with_clock(1, 2, 100);

        breaker.record_failure();
        clock.advance_ms(100);
        assert!(breaker.allow_request());

        clock.advance_ms(42);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        // Reopening restarts the cooldown from the failure.
        assert_eq!(breaker.stats().opened_at_ms, Some(142));
        assert!(!breaker.allow_request());
    }

    #[test]
    fn reset_restores_closed_from_any_state() {
        let (breaker, clock) = breaker_with_clock(1, 1, 1000);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        breaker.reset();
        let stats = breaker.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(stats.consecutive_successes, 0);
        assert_eq!(stats.opened_at_ms, None);

        // Also from half-open.
        breaker.record_failure();
        clock.advance_ms(1000);
        assert!(breaker.allow_request());
        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn execute_fails_fast_without_invoking_the_operation() {
        let (breaker, _clock) = breaker_with_clock(1, 1, 1000);
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let result = breaker
            .execute(|| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TestError)
                }
            })
            .await;
        assert_eq!(result, Err(CircuitBreakerError::Operation(TestError)));
        assert_eq!(breaker.state(), CircuitState::Open);

        let c = Arc::clone(&calls);
        let result = breaker
            .execute(|| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(())
                }
            })
            .await;
        assert_eq!(result, Err(CircuitBreakerError::OpenCircuit));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transition_listener_fires() {
        let transitions = Arc::new(Mutex::new(Vec::new()));
        let t = Arc::clone(&transitions);

        let clock = Arc::new(ManualClock::new());
        let breaker = CircuitBreaker::builder()
            .failure_threshold(1)
            .open_timeout(Duration::from_millis(100))
            .clock(clock.clone() as SharedClock)
            .on_state_transition(move |from, to| {
                t.lock().unwrap().push((from, to));
            })
            .build();

        breaker.record_failure();
        clock.advance_ms(100);
        assert!(breaker.allow_request());
        breaker.record_success();

        let seen = transitions.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (CircuitState::Closed, CircuitState::Open),
                (CircuitState::Open, CircuitState::HalfOpen),
                (CircuitState::HalfOpen, CircuitState::Closed),
            ]
        );
    }

    #[test]
    fn abandoned_probe_stops_blocking_after_the_cooldown() {
        let (breaker, clock) = breaker_with_clock(1, 1, 100);

        breaker.record_failure();
        clock.advance_ms(100);

        // The probe is admitted but its caller never reports an outcome.
        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());

        clock.advance_ms(99);
        assert!(!breaker.allow_request());

        // A fresh probe is admitted once another open timeout has elapsed.
        clock.advance_ms(1);
        assert!(breaker.allow_request());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_probe_call_does_not_wedge_the_breaker() {
        let (breaker, clock) = breaker_with_clock(1, 1, 100);

        breaker.record_failure();
        clock.advance_ms(100);

        // The probe call is dropped at the caller's deadline before the
        // operation resolves, so no outcome is ever recorded for it.
        let probe =
            breaker.execute(|| async { std::future::pending::<Result<(), TestError>>().await });
        let cancelled = tokio::time::timeout(Duration::from_millis(10), probe).await;
        assert!(cancelled.is_err());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.allow_request());

        clock.advance_ms(100);
        assert!(breaker.allow_request());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn racing_callers_get_exactly_one_probe() {
        let (breaker, clock) = breaker_with_clock(1, 1, 100);
        let breaker = Arc::new(breaker);

        breaker.record_failure();
        clock.advance_ms(100);

        let admitted = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    if breaker.allow_request() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }
}
