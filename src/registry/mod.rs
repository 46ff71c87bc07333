//! # Registry Infrastructure
//!
//! Fleet-wide state holders.
//!
//! ```text
//! Registry Infrastructure
//! ├── ElevatorRegistry   (owns every unit; bulk snapshot/step/enqueue/remove)
//! └── PendingHallCalls   (broadcast calls awaiting their first serve)
//! ```

pub mod elevator_registry;
pub mod pending_registry;

// Re-export main types for easy access
pub use elevator_registry::ElevatorRegistry;
pub use pending_registry::PendingHallCalls;
