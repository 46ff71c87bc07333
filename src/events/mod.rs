pub mod bus;
pub mod subscribers;
pub mod types;

// Re-export key types for convenience
pub use bus::{EventBus, EventBusStats, EventHandlerError, EventSubscriber, PublishReport};
pub use subscribers::LoggingSubscriber;
pub use types::{DomainEvent, EventEnvelope, EventKind};
