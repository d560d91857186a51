//! Fallback configuration and builder.

use crate::events::FallbackEvent;
use crate::{Fallback, FallbackFn};
use futures::future::FutureExt;
use guardrail_core::events::{EventListeners, FnListener};
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Where the substitute result comes from when the primary path fails.
pub(crate) enum FallbackStrategy<Res, E> {
    /// A fixed value, cloned per application.
    Value(Res),
    /// An alternate operation, invoked per application; it may itself fail.
    Function(FallbackFn<Res, E>),
    /// The last value the primary path produced, if any.
    Cache(RwLock<Option<Res>>),
}

/// Immutable configuration for a [`Fallback`].
pub struct FallbackConfig<Res, E> {
    pub(crate) strategy: FallbackStrategy<Res, E>,
    pub(crate) event_listeners: EventListeners<FallbackEvent>,
    pub(crate) name: String,
}

impl<Res, E> FallbackConfig<Res, E> {
    /// Creates a new configuration builder.
    pub fn builder() -> FallbackConfigBuilder<Res, E> {
        FallbackConfigBuilder::new()
    }
}

/// Builder for [`FallbackConfig`].
pub struct FallbackConfigBuilder<Res, E> {
    strategy: Option<FallbackStrategy<Res, E>>,
    event_listeners: EventListeners<FallbackEvent>,
    name: String,
}

impl<Res, E> Default for FallbackConfigBuilder<Res, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Res, E> FallbackConfigBuilder<Res, E> {
    /// Creates a builder. A strategy must be chosen before [`build`] is
    /// called.
    ///
    /// [`build`]: FallbackConfigBuilder::build
    pub fn new() -> Self {
        Self {
            strategy: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Substitute a fixed value when the primary path fails.
    pub fn default_value(mut self, value: Res) -> Self {
        self.strategy = Some(FallbackStrategy::Value(value));
        self
    }

    /// Invoke an alternate operation when the primary path fails. The
    /// alternate may itself fail, and its error is surfaced to the caller.
    pub fn fallback_fn<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.strategy = Some(FallbackStrategy::Function(Arc::new(move || f().boxed())));
        self
    }

    /// Substitute the last value the primary path produced. Until the
    /// primary succeeds once, the cache is empty and a primary failure is
    /// reported as exhausted.
    pub fn cache(mut self) -> Self {
        self.strategy = Some(FallbackStrategy::Cache(RwLock::new(None)));
        self
    }

    /// Sets the instance name used in emitted events.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when the primary path succeeds.
    pub fn on_primary_success<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::PrimarySucceeded { .. } = event {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked when the fallback supplies a substitute
    /// result.
    pub fn on_fallback_applied<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::FallbackApplied { .. } = event {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked when the fallback fails too.
    pub fn on_fallback_failed<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::FallbackFailed { .. } = event {
                f();
            }
        }));
        self
    }

    /// Builds the fallback wrapper.
    ///
    /// # Panics
    ///
    /// Panics if no strategy was chosen.
    pub fn build(self) -> Fallback<Res, E> {
        let strategy = self
            .strategy
            .expect("a fallback strategy must be chosen: default_value, fallback_fn, or cache");
        Fallback::new(FallbackConfig {
            strategy,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
