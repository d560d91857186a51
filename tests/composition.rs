//! End-to-end tests nesting the patterns the way the composition guide
//! recommends: Fallback → Bulkhead → CircuitBreaker → Retry → TimeLimiter →
//! operation. Everything is pulled in through the meta-crate re-exports, so
//! these tests also cover the `guardrail` feature wiring.

use guardrail::bulkhead::Bulkhead;
use guardrail::circuitbreaker::{CircuitBreaker, CircuitState};
use guardrail::core::GuardError;
use guardrail::fallback::Fallback;
use guardrail::retry::Retrier;
use guardrail::timelimiter::{TimeLimiter, TimeLimiterError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct DownstreamError;

/// The scenario that proves the short-circuit is real: an always-failing
/// operation behind a bulkhead, a breaker with `failure_threshold = 1`, and
/// a default-value fallback. The first call invokes the operation and opens
/// the breaker; the second is rejected without touching the operation; the
/// caller sees the fallback value both times.
#[tokio::test]
async fn open_breaker_prevents_reinvocation_and_fallback_absorbs_it() {
    let bulkhead = Bulkhead::builder().max_concurrent(1).build();
    let breaker = CircuitBreaker::builder().failure_threshold(1).build();
    let fallback = Fallback::with_default(0u64);

    let invocations = Arc::new(AtomicUsize::new(0));

    for expected_invocations in [1, 1] {
        let invocations = Arc::clone(&invocations);
        let result = fallback
            .execute(|| async {
                bulkhead
                    .execute(|| async {
                        breaker
                            .execute(|| async {
                                invocations.fetch_add(1, Ordering::SeqCst);
                                Err::<u64, _>(DownstreamError)
                            })
                            .await
                    })
                    .await
            })
            .await;

        assert_eq!(result, Ok(0));
        assert_eq!(invocations.load(Ordering::SeqCst), expected_invocations);
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}

#[tokio::test]
async fn full_pipeline_passes_a_success_through_unchanged() {
    let bulkhead = Bulkhead::builder().max_concurrent(4).build();
    let breaker = CircuitBreaker::builder().failure_threshold(3).build();
    let retrier = Retrier::immediate(2);
    let limiter = TimeLimiter::millis(500);
    let fallback = Fallback::with_default(0u64);

    let result = fallback
        .execute(|| async {
            bulkhead
                .execute(|| async {
                    breaker
                        .execute(|| async {
                            retrier
                                .execute(|| async {
                                    limiter
                                        .execute(|| async { Ok::<_, DownstreamError>(42) })
                                        .await
                                })
                                .await
                        })
                        .await
                })
                .await
        })
        .await;

    assert_eq!(result, Ok(42));
    assert_eq!(fallback.stats().primary_successes, 1);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(bulkhead.stats().current_concurrent, 0);
}

/// Retry sits inside the breaker, so the breaker sees one outcome per call,
/// not one per attempt: two flaky attempts followed by a success record a
/// single success.
#[tokio::test]
async fn breaker_sees_the_retried_call_as_a_single_outcome() {
    let breaker = CircuitBreaker::builder().failure_threshold(3).build();
    let retrier = Retrier::immediate(3);

    let attempts = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&attempts);

    let result = breaker
        .execute(|| async {
            retrier
                .execute(|| {
                    let a = Arc::clone(&a);
                    async move {
                        if a.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(DownstreamError)
                        } else {
                            Ok("recovered")
                        }
                    }
                })
                .await
        })
        .await;

    assert_eq!(result, Ok("recovered"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(breaker.stats().consecutive_failures, 0);
}

/// Each retry attempt gets the full time limit when the limiter is nested
/// inside the retry loop.
#[tokio::test(start_paused = true)]
async fn every_attempt_gets_its_own_time_budget() {
    let retrier = Retrier::immediate(1);
    let limiter = TimeLimiter::millis(100);

    let attempts = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&attempts);
    let limiter = &limiter;

    let result: Result<(), TimeLimiterError<DownstreamError>> = retrier
        .execute(|| {
            let a = Arc::clone(&a);
            async move {
                a.fetch_add(1, Ordering::SeqCst);
                limiter
                    .execute(|| async {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(())
                    })
                    .await
            }
        })
        .await;

    assert_eq!(
        result,
        Err(TimeLimiterError::Timeout {
            limit: Duration::from_millis(100)
        })
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

/// Every pattern error flattens into `GuardError`, so a caller can match on
/// one taxonomy at the edge instead of the nested per-layer types.
#[tokio::test]
async fn layer_errors_flatten_into_the_unified_taxonomy() {
    let breaker = CircuitBreaker::builder().failure_threshold(1).build();
    let _ = breaker
        .execute(|| async { Err::<(), _>(DownstreamError) })
        .await;

    let rejected: GuardError<DownstreamError> = breaker
        .execute(|| async { Ok::<(), _>(()) })
        .await
        .unwrap_err()
        .into();
    assert!(rejected.is_circuit_open());

    let bulkhead = Bulkhead::builder().max_concurrent(1).build();
    let _held = bulkhead.try_acquire().unwrap();
    let full: GuardError<DownstreamError> = bulkhead
        .execute(|| async { Ok::<(), _>(()) })
        .await
        .unwrap_err()
        .into();
    assert!(matches!(
        full,
        GuardError::BulkheadRejected { max_concurrent: 1 }
    ));

    let limiter = TimeLimiter::millis(10);
    let late: GuardError<DownstreamError> = limiter
        .execute(|| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        })
        .await
        .unwrap_err()
        .into();
    assert!(late.is_timeout());
}
