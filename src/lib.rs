#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lift Dispatch
//!
//! Concurrent dispatch core for a bank of elevators sharing a building.
//!
//! ## Overview
//!
//! Hall calls (a floor plus a direction) and cabin calls (a floor chosen inside a
//! specific elevator) are accepted from any number of threads, assigned to
//! elevators by a pluggable scheduler strategy, and served as the elevators are
//! stepped one floor at a time.
//!
//! ## Architecture
//!
//! - Each elevator owns its own lock and maintains separate upward and downward
//!   stop sets. It keeps travelling in one direction while stops remain ahead.
//! - State changes are announced as domain events on a synchronous in-process bus.
//!   Events are always published after the publishing elevator's lock is released.
//! - With the broadcast strategy a hall call is queued on every eligible elevator;
//!   the first to serve it clears it from the others through the pending
//!   hall-call registry.
//! - A bounded command queue drained by worker threads decouples button presses
//!   from state mutation.
//!
//! ## Module Organization
//!
//! - [`elevator`] - Elevator unit state machine and snapshots
//! - [`registry`] - Elevator registry and pending hall-call registry
//! - [`events`] - Domain event bus and subscribers
//! - [`scheduler`] - Broadcast and exclusive-ETA strategies
//! - [`dispatch`] - Dispatch service orchestrating hall and cabin calls
//! - [`command`] - Command queue and worker pool
//! - [`driver`] - Background stepping driver
//! - [`system`] - Facade wiring everything from configuration
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lift_dispatch::{ConfigManager, Direction, ElevatorSystem};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! lift_dispatch::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load()?;
//! let system = ElevatorSystem::from_manager(&manager)?;
//!
//! let ticket = system.request_elevator(5, Direction::Down)?;
//! println!("{:?}", ticket.wait()?);
//! println!("{}", system.status_report());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod command;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod driver;
pub mod elevator;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod system;

pub use command::{CommandQueue, CommandQueueStats, CommandTicket, DispatchCommand};
pub use config::{
    ConfigManager, ConfigResult, ConfigurationError, DispatchConfig, DriverConfig,
    ElevatorsConfig, QueueConfig, StrategyConfig,
};
pub use dispatch::{DispatchOutcome, DispatchService};
pub use driver::StepDriver;
pub use elevator::{Direction, ElevatorId, ElevatorSnapshot, ElevatorUnit, OperatingMode, Target};
pub use error::{DispatchError, Result};
pub use events::{
    DomainEvent, EventBus, EventBusStats, EventEnvelope, EventHandlerError, EventKind,
    EventSubscriber, LoggingSubscriber, PublishReport,
};
pub use registry::{ElevatorRegistry, PendingHallCalls};
pub use scheduler::{BroadcastStrategy, ExclusiveEtaStrategy, SchedulerStrategy, StrategyKind};
pub use system::{ElevatorSystem, StatusReport};
