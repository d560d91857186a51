//! # Composition Guide
//!
//! The pattern crates do not know about each other: each one wraps a
//! zero-argument async operation, and composing them means nesting those
//! wrappers. This guide covers the recommended nesting order and why it
//! matters.
//!
//! ## The Onion Model
//!
//! Each wrapper's `execute` takes a closure producing a future; nesting a
//! wrapper inside another's closure puts it closer to the real work:
//!
//! ```text
//! Call → [Fallback] → [Bulkhead] → [CircuitBreaker] → [Retry] → [TimeLimiter] → Operation
//! ```
//!
//! The outermost wrapper sees the call first and the result last. Order
//! matters: a time limit outside retry bounds the *total* time across
//! attempts; inside retry, each attempt gets the full limit.
//!
//! ## Recommended Order (outer → inner)
//!
//! 1. **Fallback** — the outermost safety net. It should observe and absorb
//!    every failure kind uniformly: domain errors, open circuits, bulkhead
//!    rejections, and timeouts all look the same to it.
//! 2. **Bulkhead** — admission control before any work starts. Rejecting a
//!    call over capacity must not count as a dependency failure, so it sits
//!    outside the circuit breaker.
//! 3. **CircuitBreaker** — short-circuits before retries are attempted. A
//!    rejected call costs nothing and records nothing.
//! 4. **Retry** — retries only the innermost operation (with its time
//!    limit). Keeping retry *inside* the breaker and bulkhead avoids retry
//!    storms against a dependency that is already failing or saturated:
//!    wrapper-boundary errors (open circuit, rejection) are never retried.
//! 5. **TimeLimiter** — innermost, so every individual attempt is bounded
//!    and a hung attempt turns into an error the retry loop can act on.
//!
//! ## Example
//!
//! ```
//! # #[cfg(all(feature = "circuitbreaker", feature = "fallback", feature = "retry", feature = "timelimiter"))]
//! # {
//! use guardrail::circuitbreaker::CircuitBreaker;
//! use guardrail::fallback::Fallback;
//! use guardrail::retry::Retrier;
//! use guardrail::timelimiter::TimeLimiter;
//! use std::sync::Arc;
//!
//! # #[derive(Debug, Clone)]
//! # enum ApiError { Unavailable }
//! # async fn fetch_quote() -> Result<u64, ApiError> { Ok(101) }
//! # async fn example() {
//! // Shared per-dependency instances.
//! let breaker = Arc::new(
//!     CircuitBreaker::builder()
//!         .failure_threshold(5)
//!         .open_timeout(std::time::Duration::from_secs(30))
//!         .build(),
//! );
//! let retrier = Retrier::fixed_delay(std::time::Duration::from_millis(100), 3);
//! let limiter = TimeLimiter::millis(500);
//! let fallback = Fallback::with_default(0u64);
//!
//! let quote = fallback
//!     .execute(|| async {
//!         breaker
//!             .execute(|| async {
//!                 retrier
//!                     .execute(|| async {
//!                         limiter
//!                             .execute(fetch_quote)
//!                             .await
//!                     })
//!                     .await
//!             })
//!             .await
//!     })
//!     .await;
//! # let _ = quote;
//! # }
//! # }
//! ```
//!
//! ## Error Types Across Layers
//!
//! Each wrapper adds its own error variant around the inner error type
//! (`CircuitBreakerError<TimeLimiterError<E>>` and so on). Two ways to keep
//! signatures manageable:
//!
//! - let [`Fallback`](guardrail_fallback::Fallback) absorb everything — its
//!   `execute` returns the substitute on *any* inner failure, so the nested
//!   error type never escapes, or
//! - flatten into [`GuardError`](guardrail_core::GuardError), which every
//!   pattern error converts into via `From`, and match on its variants at
//!   the edge.
//!
//! ## What Not To Do
//!
//! - Do not put Retry outside the CircuitBreaker: every retry burst then
//!   hammers a dependency the breaker already knows is failing, and open-
//!   circuit rejections get retried pointlessly.
//! - Do not share one `Retrier` stats view across unrelated dependencies
//!   expecting per-dependency numbers; instances are cheap, make one per
//!   dependency.
//! - Do not put the Bulkhead inside Retry: a saturated dependency would see
//!   each rejected attempt retried, multiplying admission pressure.
