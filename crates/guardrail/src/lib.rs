//! Composable resilience primitives for async operations.
//!
//! `guardrail` wraps caller-supplied unreliable operations (network calls,
//! downstream services) and makes their failure modes explicit and
//! controllable. Each pattern is available as both an individual crate and
//! as a feature of this meta-crate.
//!
//! # Patterns
//!
//! - **Retry** (`retry` feature): bounded retry loop with fixed, linear,
//!   exponential, and jittered backoff
//! - **Circuit Breaker** (`circuitbreaker` feature): stops calling a
//!   dependency that keeps failing, periodically re-probing it
//! - **Bulkhead** (`bulkhead` feature): caps concurrent calls so one
//!   overloaded dependency cannot exhaust every caller
//! - **Time Limiter** (`timelimiter` feature): bounds the wall-clock
//!   duration of a single call
//! - **Fallback** (`fallback` feature): substitutes a fixed value, an
//!   alternate operation, or the cached last-good result
//!
//! # Usage
//!
//! Enable specific patterns via features:
//!
//! ```toml
//! [dependencies]
//! guardrail = { version = "0.1", features = ["circuitbreaker", "retry"] }
//! ```
//!
//! Or enable all patterns:
//!
//! ```toml
//! [dependencies]
//! guardrail = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Example
//!
//! ```
//! # #[cfg(all(feature = "circuitbreaker", feature = "retry"))]
//! # {
//! use guardrail::circuitbreaker::CircuitBreaker;
//! use guardrail::retry::Retrier;
//! use std::time::Duration;
//!
//! # #[derive(Debug, Clone)]
//! # struct DbError;
//! # async fn query() -> Result<u32, DbError> { Ok(1) }
//! # async fn example() {
//! let breaker = CircuitBreaker::builder()
//!     .failure_threshold(3)
//!     .open_timeout(Duration::from_secs(10))
//!     .build();
//! let retrier = Retrier::fixed_delay(Duration::from_millis(50), 2);
//!
//! let result = breaker
//!     .execute(|| async { retrier.execute(query).await })
//!     .await;
//! # let _ = result;
//! # }
//! # }
//! ```
//!
//! See the [`composition`] module for the recommended nesting order and the
//! reasoning behind it.
//!
//! # Individual Crates
//!
//! Each pattern is also available standalone for minimal dependencies:
//!
//! - `guardrail-retry`
//! - `guardrail-circuitbreaker`
//! - `guardrail-bulkhead`
//! - `guardrail-timelimiter`
//! - `guardrail-fallback`
//! - `guardrail-core` (shared infrastructure: clock, events, unified error)

pub mod composition;

// Re-export core (always available)
pub use guardrail_core as core;

// Re-export patterns based on features
#[cfg(feature = "bulkhead")]
pub use guardrail_bulkhead as bulkhead;

#[cfg(feature = "circuitbreaker")]
pub use guardrail_circuitbreaker as circuitbreaker;

#[cfg(feature = "fallback")]
pub use guardrail_fallback as fallback;

#[cfg(feature = "retry")]
pub use guardrail_retry as retry;

#[cfg(feature = "timelimiter")]
pub use guardrail_timelimiter as timelimiter;
