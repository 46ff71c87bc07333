//! # Domain Event Bus
//!
//! Synchronous publish/subscribe fan-out for dispatch events.
//!
//! ## Delivery
//!
//! Events are delivered on the publishing thread's call stack, in subscription
//! order. Whoever calls `publish` (the stepping driver, a command worker) also
//! runs every matching handler before `publish` returns, so handlers must not
//! block indefinitely.
//!
//! ## Isolation
//!
//! Each handler runs behind its own error boundary. A handler that returns an
//! error or panics is logged and counted; the remaining handlers still receive
//! the event and nothing propagates back to the publisher.
//!
//! ## Usage
//!
//! ```rust
//! use lift_dispatch::events::{DomainEvent, EventBus, EventKind};
//! use lift_dispatch::elevator::Direction;
//!
//! let bus = EventBus::new();
//! bus.subscribe_fn("printer", &[EventKind::StopServed], |envelope| {
//!     println!("{:?}", envelope.event);
//!     Ok(())
//! });
//!
//! let report = bus.publish(DomainEvent::StopServed {
//!     unit_id: 1,
//!     floor: 3,
//!     direction: Direction::Up,
//! });
//! assert_eq!(report.delivered, 1);
//! ```

use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, trace};

use super::types::{DomainEvent, EventEnvelope, EventKind};

/// Errors a handler may report back to the bus
#[derive(Debug, Clone, Error)]
pub enum EventHandlerError {
    /// Handler execution failed
    #[error("Subscriber '{subscriber}' failed on event '{event_type}': {reason}")]
    ExecutionFailed {
        subscriber: String,
        event_type: String,
        reason: String,
    },

    /// Handler panicked (caught by the bus)
    #[error("Subscriber '{subscriber}' panicked on event '{event_type}': {reason}")]
    HandlerPanicked {
        subscriber: String,
        event_type: String,
        reason: String,
    },

    /// Generic error for handler failures
    #[error("Handler error: {0}")]
    Generic(String),
}

/// Trait for event subscribers
pub trait EventSubscriber: Send + Sync {
    /// Handle an event
    fn handle_event(&self, envelope: &EventEnvelope) -> Result<(), EventHandlerError>;

    /// Get subscriber name for identification
    fn subscriber_name(&self) -> &str {
        "unnamed_subscriber"
    }
}

/// Adapter so plain closures can subscribe
struct FnSubscriber<F> {
    name: String,
    handler: F,
}

impl<F> EventSubscriber for FnSubscriber<F>
where
    F: Fn(&EventEnvelope) -> Result<(), EventHandlerError> + Send + Sync,
{
    fn handle_event(&self, envelope: &EventEnvelope) -> Result<(), EventHandlerError> {
        (self.handler)(envelope)
    }

    fn subscriber_name(&self) -> &str {
        &self.name
    }
}

/// Subscription information
#[derive(Clone)]
struct Subscription {
    name: String,
    /// Empty means every kind
    kinds: Vec<EventKind>,
    subscriber: Arc<dyn EventSubscriber>,
}

impl Subscription {
    fn matches(&self, kind: EventKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}

/// Outcome of a single `publish` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Handlers that completed successfully
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

/// Lifetime counters for the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventBusStats {
    pub events_published: u64,
    pub handler_failures: u64,
    pub subscriber_count: usize,
}

/// Synchronous event bus
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
    events_published: AtomicU64,
    handler_failures: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for the given event kinds (empty slice = all kinds)
    pub fn subscribe(
        &self,
        name: impl Into<String>,
        kinds: &[EventKind],
        subscriber: Arc<dyn EventSubscriber>,
    ) {
        let name = name.into();
        debug!(subscriber = %name, kinds = ?kinds, "Registered event subscriber");
        self.subscriptions.write().push(Subscription {
            name,
            kinds: kinds.to_vec(),
            subscriber,
        });
    }

    /// Register a closure as a subscriber
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, kinds: &[EventKind], handler: F)
    where
        F: Fn(&EventEnvelope) -> Result<(), EventHandlerError> + Send + Sync + 'static,
    {
        let name = name.into();
        let subscriber = Arc::new(FnSubscriber {
            name: name.clone(),
            handler,
        });
        self.subscribe(name, kinds, subscriber);
    }

    /// Remove every subscription registered under `name`; returns how many were removed
    pub fn unsubscribe(&self, name: &str) -> usize {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.name != name);
        before - subscriptions.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Publish an event to every matching subscriber on the calling thread
    pub fn publish(&self, event: DomainEvent) -> PublishReport {
        let envelope = EventEnvelope::new(event);
        let kind = envelope.kind();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Handlers may subscribe or publish in turn, so never call them under the lock
        let matching: Vec<Subscription> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.matches(kind))
            .cloned()
            .collect();

        trace!(
            event_id = %envelope.event_id,
            event_type = %kind,
            subscribers = matching.len(),
            "Publishing event"
        );

        let mut report = PublishReport::default();
        for subscription in &matching {
            match Self::deliver(subscription, &envelope) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    self.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        subscriber = %subscription.name,
                        event_id = %envelope.event_id,
                        event_type = %kind,
                        error = %e,
                        payload = %envelope.to_json(),
                        "Event subscriber failed"
                    );
                }
            }
        }

        report
    }

    fn deliver(subscription: &Subscription, envelope: &EventEnvelope) -> Result<(), EventHandlerError> {
        let subscriber = Arc::clone(&subscription.subscriber);
        match panic::catch_unwind(AssertUnwindSafe(|| subscriber.handle_event(envelope))) {
            Ok(result) => result,
            Err(payload) => Err(EventHandlerError::HandlerPanicked {
                subscriber: subscription.name.clone(),
                event_type: envelope.kind().to_string(),
                reason: panic_message(payload.as_ref()),
            }),
        }
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            events_published: self.events_published.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            subscriber_count: self.subscriber_count(),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .subscriptions
            .read()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        f.debug_struct("EventBus")
            .field("subscribers", &names)
            .field("events_published", &self.events_published.load(Ordering::Relaxed))
            .finish()
    }
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
