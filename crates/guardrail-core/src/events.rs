//! Event system for guardrail patterns.
//!
//! Every pattern emits events (state transitions, rejections, applied
//! fallbacks) to listeners registered at configuration time. The library
//! itself logs and exports nothing; callers wire listeners to whatever
//! metrics or logging pipeline they run.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Trait implemented by each pattern's event enum.
pub trait ResilienceEvent: Send + Sync + fmt::Debug {
    /// A short machine-readable event kind (e.g. `"state_transition"`).
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;

    /// The configured name of the pattern instance that emitted this event.
    fn pattern_name(&self) -> &str;
}

/// A listener for pattern events.
pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    /// Called for every emitted event.
    fn on_event(&self, event: &E);
}

/// A listener handle that can be registered with several collections at
/// once, e.g. one sink observing every breaker in a process.
pub type SharedListener<E> = Arc<dyn EventListener<E>>;

/// An immutable collection of listeners, shared by all calls through a
/// pattern instance.
#[derive(Clone)]
pub struct EventListeners<E: ResilienceEvent> {
    registered: Vec<SharedListener<E>>,
}

impl<E: ResilienceEvent> EventListeners<E> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            registered: Vec::new(),
        }
    }

    /// Registers a listener, taking ownership of it.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.add_shared(Arc::new(listener));
    }

    /// Registers an already-shared listener handle.
    pub fn add_shared(&mut self, listener: SharedListener<E>) {
        self.registered.push(listener);
    }

    /// Emits an event to every registered listener.
    ///
    /// A panicking listener is isolated so the remaining listeners still run.
    pub fn emit(&self, event: &E) {
        for listener in &self.registered {
            Self::dispatch(listener.as_ref(), event);
        }
    }

    fn dispatch(listener: &dyn EventListener<E>, event: &E) {
        let _ = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
    }

    /// Returns true if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.registered.len()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

// Listeners are opaque closures; only the count is worth printing.
impl<E: ResilienceEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("registered", &self.registered.len())
            .finish()
    }
}

/// Adapts a plain closure into an [`EventListener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _marker: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Wraps a closure as a listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ResilienceEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TickEvent {
        name: String,
        at: Instant,
    }

    impl ResilienceEvent for TickEvent {
        fn event_type(&self) -> &'static str {
            "tick"
        }

        fn timestamp(&self) -> Instant {
            self.at
        }

        fn pattern_name(&self) -> &str {
            &self.name
        }
    }

    fn tick() -> TickEvent {
        TickEvent {
            name: "ticker".to_string(),
            at: Instant::now(),
        }
    }

    fn counting_listener() -> (Arc<AtomicUsize>, impl EventListener<TickEvent>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener = FnListener::new(move |_: &TickEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn every_listener_sees_every_event() {
        let (first, first_listener) = counting_listener();
        let (second, second_listener) = counting_listener();

        let mut listeners = EventListeners::new();
        listeners.add(first_listener);
        listeners.add(second_listener);
        assert_eq!(listeners.len(), 2);

        listeners.emit(&tick());
        listeners.emit(&tick());

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn shared_listener_fans_out_across_collections() {
        let (count, listener) = counting_listener();
        let shared: SharedListener<TickEvent> = Arc::new(listener);

        let mut first = EventListeners::new();
        first.add_shared(Arc::clone(&shared));
        let mut second = EventListeners::new();
        second.add_shared(shared);

        first.emit(&tick());
        second.emit(&tick());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let (reached, listener) = counting_listener();

        let mut listeners = EventListeners::new();
        listeners.add(FnListener::new(|_: &TickEvent| {
            panic!("listener bug");
        }));
        listeners.add(listener);

        listeners.emit(&tick());
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_shows_the_listener_count() {
        let mut listeners = EventListeners::<TickEvent>::new();
        assert!(listeners.is_empty());
        listeners.add(FnListener::new(|_: &TickEvent| {}));
        assert_eq!(format!("{listeners:?}"), "EventListeners { registered: 1 }");
    }
}
