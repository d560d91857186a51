//! Monotonic time source abstraction.
//!
//! Components that make timing decisions (the circuit breaker's open-state
//! cooldown, deadline math) take a [`Clock`] instead of reading the system
//! clock directly, so tests can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonically increasing millisecond time source.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since an arbitrary, fixed origin.
    ///
    /// Only differences between readings are meaningful; the origin is
    /// implementation defined.
    fn now_ms(&self) -> u64;
}

/// Shared handle to a clock implementation.
pub type SharedClock = Arc<dyn Clock>;

/// Production clock backed by [`std::time::Instant`].
///
/// The origin is the moment the clock was constructed, which keeps readings
/// small and immune to wall-clock adjustments.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually driven clock for deterministic tests.
///
/// Time only moves when [`advance_ms`](ManualClock::advance_ms) or
/// [`set_ms`](ManualClock::set_ms) is called.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock starting at the given millisecond reading.
    pub fn at_ms(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Moves the clock forward by `delta` milliseconds.
    pub fn advance_ms(&self, delta: u64) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute reading.
    pub fn set_ms(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
