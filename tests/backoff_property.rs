//! Property tests for the backoff strategies: determinism of the pure
//! variants, saturation at the cap, and the jitter envelope.

use guardrail_retry::{
    ExponentialBackoff, ExponentialJitterBackoff, FixedInterval, IntervalFunction, LinearBackoff,
};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn fixed_is_deterministic_and_constant(
        delay_ms in 0u64..10_000,
        attempt in 1u32..1_000,
    ) {
        let backoff = FixedInterval::new(Duration::from_millis(delay_ms));
        prop_assert_eq!(backoff.delay_for(attempt), Duration::from_millis(delay_ms));
        prop_assert_eq!(backoff.delay_for(attempt), backoff.delay_for(attempt));
    }

    #[test]
    fn exponential_is_deterministic_and_capped(
        initial_ms in 1u64..1_000,
        extra_ms in 0u64..100_000,
        attempt in 1u32..10_000,
    ) {
        let max = Duration::from_millis(initial_ms + extra_ms);
        let backoff = ExponentialBackoff::new(Duration::from_millis(initial_ms))
            .with_max_delay(max);

        let delay = backoff.delay_for(attempt);
        prop_assert_eq!(delay, backoff.delay_for(attempt));
        prop_assert!(delay <= max);
        prop_assert!(delay >= Duration::from_millis(initial_ms) || delay == max);
    }

    #[test]
    fn exponential_never_shrinks_with_attempt(
        initial_ms in 1u64..1_000,
        extra_ms in 0u64..100_000,
        attempt in 1u32..200,
    ) {
        let backoff = ExponentialBackoff::new(Duration::from_millis(initial_ms))
            .with_max_delay(Duration::from_millis(initial_ms + extra_ms));
        prop_assert!(backoff.delay_for(attempt + 1) >= backoff.delay_for(attempt));
    }

    #[test]
    fn linear_is_deterministic_and_capped(
        initial_ms in 0u64..1_000,
        step_ms in 0u64..1_000,
        extra_ms in 0u64..100_000,
        attempt in 1u32..10_000,
    ) {
        let max = Duration::from_millis(initial_ms + extra_ms);
        let backoff = LinearBackoff::new(
            Duration::from_millis(initial_ms),
            Duration::from_millis(step_ms),
        )
        .with_max_delay(max);

        let delay = backoff.delay_for(attempt);
        prop_assert_eq!(delay, backoff.delay_for(attempt));
        prop_assert!(delay <= max);

        let uncapped = initial_ms as u128 + step_ms as u128 * (attempt as u128 - 1);
        let expected = uncapped.min(max.as_millis());
        prop_assert_eq!(delay.as_millis(), expected);
    }

    #[test]
    fn jitter_stays_within_the_exponential_envelope(
        initial_ms in 1u64..1_000,
        extra_ms in 0u64..10_000,
        attempt in 1u32..100,
    ) {
        let max = Duration::from_millis(initial_ms + extra_ms);
        let envelope = ExponentialBackoff::new(Duration::from_millis(initial_ms))
            .with_max_delay(max);
        let jittered = ExponentialJitterBackoff::new(Duration::from_millis(initial_ms))
            .with_max_delay(max);

        for _ in 0..10 {
            prop_assert!(jittered.delay_for(attempt) <= envelope.delay_for(attempt));
        }
    }
}
