//! # Dispatch Service
//!
//! Entry points for hall calls and cabin calls.
//!
//! A hall call is handled end to end on the calling thread:
//!
//! ```text
//! request_elevator(floor, direction)
//!     ├─→ publish HallCallRaised
//!     ├─→ registry.snapshot_all()
//!     ├─→ strategy.select(...)          (empty → Dropped, nothing else happens)
//!     ├─→ resolve the chosen ids         (unknown id → error, nothing queued)
//!     ├─→ publish AssignmentMade(ids)
//!     ├─→ broadcast: pending.register(floor, direction, units)
//!     └─→ exclusive: enqueue target on the chosen unit
//! ```
//!
//! A broadcast call is recorded as pending and queued on its units under the
//! same registry entry, so a unit serving the floor mid fan-out still resolves
//! the call on every other unit.
//!
//! Cabin calls skip scheduling entirely and go straight to the named unit.
//!
//! The active strategy sits behind an `RwLock<Arc<..>>` so it can be swapped
//! while calls are in flight; each call reads the reference once and uses that
//! strategy throughout.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::elevator::{Direction, ElevatorId, ElevatorSnapshot, Target};
use crate::error::{DispatchError, Result};
use crate::events::{DomainEvent, EventBus};
use crate::logging::log_dispatch_operation;
use crate::registry::{ElevatorRegistry, PendingHallCalls};
use crate::scheduler::SchedulerStrategy;

/// What happened to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Hall call queued on these units
    Assigned { unit_ids: Vec<ElevatorId> },
    /// No eligible unit; the hall call was dropped without an assignment event
    Dropped,
    /// Cabin call queued on this unit
    CabinQueued { unit_id: ElevatorId },
}

impl DispatchOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }

    pub fn assigned_units(&self) -> &[ElevatorId] {
        match self {
            Self::Assigned { unit_ids } => unit_ids,
            _ => &[],
        }
    }
}

pub struct DispatchService {
    bus: Arc<EventBus>,
    registry: Arc<ElevatorRegistry>,
    pending: Arc<PendingHallCalls>,
    strategy: RwLock<Arc<dyn SchedulerStrategy>>,
}

impl DispatchService {
    pub fn new(
        bus: Arc<EventBus>,
        registry: Arc<ElevatorRegistry>,
        pending: Arc<PendingHallCalls>,
        strategy: Arc<dyn SchedulerStrategy>,
    ) -> Self {
        info!(
            strategy = strategy.name(),
            units = registry.len(),
            "Dispatch service initialized"
        );
        Self {
            bus,
            registry,
            pending,
            strategy: RwLock::new(strategy),
        }
    }

    /// Raise a hall call at `floor` for `direction` (`Up` or `Down`)
    #[instrument(skip(self), fields(strategy = tracing::field::Empty))]
    pub fn request_elevator(&self, floor: i32, direction: Direction) -> Result<DispatchOutcome> {
        if !direction.is_hall_direction() {
            return Err(DispatchError::InvalidDirection { floor, direction });
        }

        self.bus.publish(DomainEvent::HallCallRaised { floor, direction });

        let strategy = self.strategy();
        tracing::Span::current().record("strategy", strategy.name());

        let snapshots = self.registry.snapshot_all();
        let selected = strategy.select(floor, direction, &snapshots);

        if selected.is_empty() {
            log_dispatch_operation("hall_call", None, Some(floor), Some(direction), "dropped", None);
            warn!(
                floor = floor,
                direction = %direction,
                strategy = strategy.name(),
                "No eligible elevator, hall call dropped"
            );
            return Ok(DispatchOutcome::Dropped);
        }

        let broadcast = strategy.is_broadcast();
        let unit_ids = if broadcast {
            selected
        } else {
            selected.into_iter().take(1).collect()
        };

        let units = unit_ids
            .iter()
            .map(|&unit_id| self.registry.get(unit_id))
            .collect::<Result<Vec<_>>>()?;

        self.bus.publish(DomainEvent::AssignmentMade {
            floor,
            direction,
            unit_ids: unit_ids.clone(),
        });

        if broadcast {
            self.pending.register(floor, direction, &units);
        } else {
            let target = Target::new(floor, direction);
            for unit in &units {
                unit.enqueue_target(target);
            }
        }

        log_dispatch_operation(
            "hall_call",
            None,
            Some(floor),
            Some(direction),
            "assigned",
            Some(format!("{} via {}", format_ids(&unit_ids), strategy.name()).as_str()),
        );
        Ok(DispatchOutcome::Assigned { unit_ids })
    }

    /// Queue a cabin stop on one unit; bypasses scheduling and broadcast tracking
    #[instrument(skip(self))]
    pub fn request_car_call(&self, unit_id: ElevatorId, floor: i32) -> Result<DispatchOutcome> {
        self.registry
            .add_to_target_queue(unit_id, Target::cabin(floor))?;
        log_dispatch_operation("car_call", Some(unit_id), Some(floor), None, "queued", None);
        Ok(DispatchOutcome::CabinQueued { unit_id })
    }

    /// Step every unit once
    pub fn step_all(&self) -> Vec<DomainEvent> {
        self.registry.step_all()
    }

    /// Per-unit status, ascending id order
    pub fn status(&self) -> Vec<ElevatorSnapshot> {
        self.registry.snapshot_all()
    }

    /// Current strategy
    pub fn strategy(&self) -> Arc<dyn SchedulerStrategy> {
        self.strategy.read().clone()
    }

    /// Replace the active strategy, returning the previous one
    pub fn set_strategy(&self, strategy: Arc<dyn SchedulerStrategy>) -> Arc<dyn SchedulerStrategy> {
        let previous = std::mem::replace(&mut *self.strategy.write(), strategy);
        info!(
            from = previous.name(),
            to = self.strategy().name(),
            "Scheduler strategy swapped"
        );
        previous
    }

    pub fn registry(&self) -> &Arc<ElevatorRegistry> {
        &self.registry
    }

    pub fn pending(&self) -> &Arc<PendingHallCalls> {
        &self.pending
    }
}

fn format_ids(unit_ids: &[ElevatorId]) -> String {
    let ids: Vec<String> = unit_ids.iter().map(ToString::to_string).collect();
    format!("units [{}]", ids.join(", "))
}

impl std::fmt::Debug for DispatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchService")
            .field("strategy", &self.strategy().name())
            .field("units", &self.registry.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
