//! # Elevator System
//!
//! Wires the dispatch core together from a [`DispatchConfig`] and exposes the
//! in-process API used by a presentation or demo layer.
//!
//! ```text
//! ElevatorSystem
//! ├── EventBus ──────────────┬── LoggingSubscriber
//! │                          └── PendingHallCalls ──→ ElevatorRegistry
//! ├── ElevatorRegistry (units 1..=n)
//! ├── DispatchService (strategy, registry, pending, bus)
//! ├── CommandQueue ──→ DispatchService
//! └── StepDriver (optional) ──→ ElevatorRegistry
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lift_dispatch::{DispatchConfig, Direction, ElevatorSystem};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let system = ElevatorSystem::new(&DispatchConfig::with_uniform_fleet(2, 0))?;
//! let outcome = system.request_elevator(3, Direction::Up)?.wait()?;
//! println!("{outcome:?}");
//!
//! for _ in 0..3 {
//!     system.step();
//! }
//! println!("{}", system.status_report());
//! system.shutdown();
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::command::{CommandQueue, CommandQueueStats, CommandTicket, DispatchCommand};
use crate::config::{ConfigManager, DispatchConfig};
use crate::constants::system::PENDING_HALL_CALLS_SUBSCRIBER;
use crate::dispatch::DispatchService;
use crate::driver::StepDriver;
use crate::elevator::{Direction, ElevatorId, ElevatorSnapshot, OperatingMode, Target};
use crate::error::Result;
use crate::events::{DomainEvent, EventBus, LoggingSubscriber};
use crate::registry::{ElevatorRegistry, PendingHallCalls};
use crate::scheduler::{SchedulerStrategy, StrategyKind};

/// Read-only view of the whole fleet, printable as a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub strategy: StrategyKind,
    pub units: Vec<ElevatorSnapshot>,
    pub pending_hall_calls: Vec<Target>,
}

impl StatusReport {
    pub fn unit(&self, unit_id: ElevatorId) -> Option<&ElevatorSnapshot> {
        self.units.iter().find(|s| s.id == unit_id)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "strategy: {}", self.strategy)?;
        for unit in &self.units {
            writeln!(f, "{unit}")?;
        }
        if !self.pending_hall_calls.is_empty() {
            let pending: Vec<String> = self.pending_hall_calls.iter().map(Target::to_string).collect();
            writeln!(f, "pending hall calls: {}", pending.join(", "))?;
        }
        Ok(())
    }
}

pub struct ElevatorSystem {
    config: DispatchConfig,
    bus: Arc<EventBus>,
    registry: Arc<ElevatorRegistry>,
    pending: Arc<PendingHallCalls>,
    dispatch: Arc<DispatchService>,
    queue: CommandQueue,
    driver: Mutex<Option<StepDriver>>,
}

impl ElevatorSystem {
    pub fn new(config: &DispatchConfig) -> Result<Self> {
        config.validate()?;

        let bus = Arc::new(EventBus::new());
        bus.subscribe(LoggingSubscriber::NAME, &[], Arc::new(LoggingSubscriber::new()));

        let registry = Arc::new(ElevatorRegistry::new(
            &config.elevators.start_floors,
            Arc::clone(&bus),
        ));
        let pending =
            PendingHallCalls::attach(Arc::clone(&registry), &bus, PENDING_HALL_CALLS_SUBSCRIBER);
        let dispatch = Arc::new(DispatchService::new(
            Arc::clone(&bus),
            Arc::clone(&registry),
            Arc::clone(&pending),
            config.dispatch.strategy.build(),
        ));
        let queue = CommandQueue::start(&config.queue, Arc::clone(&dispatch))?;

        info!(
            units = registry.len(),
            strategy = %config.dispatch.strategy,
            workers = config.queue.worker_count,
            "Elevator system started"
        );

        Ok(Self {
            config: config.clone(),
            bus,
            registry,
            pending,
            dispatch,
            queue,
            driver: Mutex::new(None),
        })
    }

    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        Self::new(manager.config())
    }

    /// Raise a hall call through the command queue
    pub fn request_elevator(&self, floor: i32, direction: Direction) -> Result<CommandTicket> {
        self.queue.submit(DispatchCommand::hall_call(floor, direction))
    }

    /// Raise a cabin call through the command queue
    pub fn request_car_call(&self, unit_id: ElevatorId, floor: i32) -> Result<CommandTicket> {
        self.queue.submit(DispatchCommand::car_call(unit_id, floor))
    }

    pub fn submit(&self, command: DispatchCommand) -> Result<CommandTicket> {
        self.queue.submit(command)
    }

    /// Advance every elevator by one floor on the calling thread
    pub fn step(&self) -> Vec<DomainEvent> {
        self.dispatch.step_all()
    }

    /// Per-unit snapshots, ascending id order
    pub fn status(&self) -> Vec<ElevatorSnapshot> {
        self.dispatch.status()
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            strategy: self.dispatch.strategy().kind(),
            units: self.dispatch.status(),
            pending_hall_calls: self.pending.pending(),
        }
    }

    pub fn set_strategy(&self, kind: StrategyKind) {
        self.dispatch.set_strategy(kind.build());
    }

    pub fn set_custom_strategy(&self, strategy: Arc<dyn SchedulerStrategy>) {
        self.dispatch.set_strategy(strategy);
    }

    pub fn set_mode(&self, unit_id: ElevatorId, mode: OperatingMode) -> Result<OperatingMode> {
        self.registry.set_mode(unit_id, mode)
    }

    /// Start stepping the fleet in the background at the configured interval.
    /// Does nothing if the driver is already running.
    pub fn start_driver(&self) -> Result<()> {
        let mut driver = self.driver.lock();
        if driver.is_none() {
            *driver = Some(StepDriver::start(
                Arc::clone(&self.registry),
                self.config.driver.step_interval(),
            )?);
        }
        Ok(())
    }

    pub fn stop_driver(&self) {
        if let Some(driver) = self.driver.lock().take() {
            driver.stop();
        }
    }

    /// Stop the background driver and the command queue workers. Idempotent.
    /// Manual `step` calls keep working afterwards.
    pub fn shutdown(&self) {
        self.stop_driver();
        self.queue.shutdown();
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn dispatch(&self) -> &Arc<DispatchService> {
        &self.dispatch
    }

    pub fn registry(&self) -> &Arc<ElevatorRegistry> {
        &self.registry
    }

    pub fn pending(&self) -> &Arc<PendingHallCalls> {
        &self.pending
    }

    pub fn queue_stats(&self) -> CommandQueueStats {
        self.queue.stats()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

impl Drop for ElevatorSystem {
    fn drop(&mut self) {
        self.shutdown();
        // The bus holds the pending registry, which holds the units, which hold the bus
        self.bus.unsubscribe(PENDING_HALL_CALLS_SUBSCRIBER);
        self.bus.unsubscribe(LoggingSubscriber::NAME);
    }
}

impl fmt::Debug for ElevatorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevatorSystem")
            .field("dispatch", &self.dispatch)
            .field("queue", &self.queue)
            .field("driver_running", &self.driver.lock().is_some())
            .finish()
    }
}
