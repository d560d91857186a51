//! Core infrastructure for guardrail.
//!
//! This crate provides the shared pieces every guardrail pattern builds on:
//! - A [`Clock`] abstraction so timing-sensitive components (circuit breaker,
//!   deadlines) can be tested deterministically
//! - The event system used by all patterns for observability
//! - [`GuardError`], a unified error type for composed pipelines

pub mod clock;
pub mod error;
pub mod events;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::GuardError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent, SharedListener};
