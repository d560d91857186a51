//! Backoff strategies for the retry loop.
//!
//! Every strategy is a pure function of the configuration and the attempt
//! number (except the jittered variant, which draws from a uniform
//! distribution bounded by the pure exponential value).

use rand::Rng;
use std::time::Duration;

/// Computes the delay before the retry that follows a failed attempt.
///
/// `attempt` is 1-based: `delay_for(1)` is the delay after the first failed
/// attempt.
pub trait IntervalFunction: Send + Sync {
    /// Delay to sleep before retrying after the given failed attempt.
    fn delay_for(&self, attempt: u32) -> Duration;
}

/// The same delay between every attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    delay: Duration,
}

impl FixedInterval {
    /// Creates a fixed-interval strategy.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl IntervalFunction for FixedInterval {
    fn delay_for(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// No delay at all; retries fire back to back.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl IntervalFunction for Immediate {
    fn delay_for(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Exponentially growing delay, capped at a maximum.
///
/// `delay(attempt) = min(initial * multiplier^(attempt - 1), max)`
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    initial: Duration,
    multiplier: f64,
    max: Duration,
}

impl ExponentialBackoff {
    /// Creates an exponential strategy with multiplier 2.0 and a 30 second cap.
    pub fn new(initial: Duration) -> Self {
        Self {
            initial,
            multiplier: 2.0,
            max: Duration::from_secs(30),
        }
    }

    /// Sets the per-attempt multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier <= 1.0`.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 1.0, "multiplier must be greater than 1.0");
        self.multiplier = multiplier;
        self
    }

    /// Sets the cap the delay saturates at.
    ///
    /// # Panics
    ///
    /// Panics if `max` is below the initial delay.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        assert!(max >= self.initial, "max delay must be >= initial delay");
        self.max = max;
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        // f64 overflows to infinity for large exponents; min() pulls it back
        // to the cap.
        let raw = self.initial.as_millis() as f64 * self.multiplier.powi(exponent as i32);
        let capped = raw.min(self.max.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Exponential backoff with full jitter: a uniformly random delay in
/// `[0, exponential(attempt)]`.
///
/// Randomizing the delay decorrelates retry storms across many callers
/// hitting the same failing dependency.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialJitterBackoff {
    inner: ExponentialBackoff,
}

impl ExponentialJitterBackoff {
    /// Creates a jittered exponential strategy with multiplier 2.0 and a
    /// 30 second cap.
    pub fn new(initial: Duration) -> Self {
        Self {
            inner: ExponentialBackoff::new(initial),
        }
    }

    /// Sets the per-attempt multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier <= 1.0`.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.inner = self.inner.with_multiplier(multiplier);
        self
    }

    /// Sets the cap the undithered delay saturates at.
    ///
    /// # Panics
    ///
    /// Panics if `max` is below the initial delay.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.inner = self.inner.with_max_delay(max);
        self
    }
}

impl IntervalFunction for ExponentialJitterBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let cap = self.inner.delay_for(attempt).as_millis() as u64;
        let jittered = rand::rng().random_range(0..=cap);
        Duration::from_millis(jittered)
    }
}

/// Linearly growing delay, capped at a maximum.
///
/// `delay(attempt) = min(initial + step * (attempt - 1), max)`
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    initial: Duration,
    step: Duration,
    max: Duration,
}

impl LinearBackoff {
    /// Creates a linear strategy with a 30 second cap.
    pub fn new(initial: Duration, step: Duration) -> Self {
        Self {
            initial,
            step,
            max: Duration::from_secs(30),
        }
    }

    /// Sets the cap the delay saturates at.
    ///
    /// # Panics
    ///
    /// Panics if `max` is below the initial delay.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        assert!(max >= self.initial, "max delay must be >= initial delay");
        self.max = max;
        self
    }
}

impl IntervalFunction for LinearBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1);
        let raw = self.initial.saturating_add(self.step.saturating_mul(steps));
        raw.min(self.max)
    }
}

/// Custom closure-based strategy.
pub struct FnInterval<F>
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    /// Wraps a closure as an interval function.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay_for(&self, attempt: u32) -> Duration {
        (self.f)(attempt)
    }
}
