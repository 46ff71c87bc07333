//! # Pending Hall-Call Registry
//!
//! Cross-unit cancellation for broadcast hall calls.
//!
//! When a hall call is fanned out to several elevators, only the first one to
//! arrive should stop. The call's (floor, direction) is recorded here and queued
//! on every chosen unit in one step; the first "stop served" event for that key
//! removes it and withdraws the same hall stop from every other unit.
//!
//! ## Locking
//!
//! Registration and resolution both run while holding the key's map entry, and
//! take unit locks only inside it. Units never touch this map while holding
//! their own lock (served events are published after the unit lock is
//! released), so the order is always entry then unit. A unit that serves the
//! call while it is still being fanned out waits for the fan-out to finish, and
//! its resolution then reaches every unit the call was queued on.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::elevator_registry::ElevatorRegistry;
use crate::elevator::{Direction, ElevatorId, ElevatorUnit, Target};
use crate::events::{DomainEvent, EventBus, EventEnvelope, EventHandlerError, EventKind, EventSubscriber};

#[derive(Debug)]
pub struct PendingHallCalls {
    /// Unresolved broadcast keys and the units they were queued on
    pending: DashMap<Target, BTreeSet<ElevatorId>>,
    registry: Arc<ElevatorRegistry>,
}

impl PendingHallCalls {
    pub fn new(registry: Arc<ElevatorRegistry>) -> Self {
        Self {
            pending: DashMap::new(),
            registry,
        }
    }

    /// Create the registry and subscribe it to served events on `bus`
    pub fn attach(registry: Arc<ElevatorRegistry>, bus: &EventBus, name: &str) -> Arc<Self> {
        let pending = Arc::new(Self::new(registry));
        bus.subscribe(name, &[EventKind::StopServed], pending.clone());
        pending
    }

    /// Record an unresolved broadcast call and queue it on `units`.
    ///
    /// Returns `false` if the key was already pending; the units are still
    /// queued and joined to the existing entry.
    pub fn register(&self, floor: i32, direction: Direction, units: &[Arc<ElevatorUnit>]) -> bool {
        let target = Target::new(floor, direction);
        let entry = self.pending.entry(target);
        let added = matches!(entry, Entry::Vacant(_));

        let mut holders = entry.or_default();
        for unit in units {
            unit.enqueue_target(target);
            holders.insert(unit.id());
        }
        let assigned: Vec<ElevatorId> = holders.iter().copied().collect();
        drop(holders);

        debug!(
            floor = floor,
            direction = %direction,
            added = added,
            units = ?assigned,
            "Broadcast hall call pending"
        );
        added
    }

    /// Resolve (floor, direction) in favour of `unit_id`.
    ///
    /// Returns the number of other units the stop was removed from, or `None`
    /// when the key was not pending (an exclusive call, or already resolved).
    pub fn on_served(&self, unit_id: ElevatorId, floor: i32, direction: Direction) -> Option<usize> {
        let entry = match self.pending.entry(Target::new(floor, direction)) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return None,
        };

        let removed = self.registry.remove_for_others(unit_id, floor, direction);
        let holders = entry.remove();
        info!(
            unit_id = unit_id,
            floor = floor,
            direction = %direction,
            assigned = ?holders,
            cancelled_on = removed,
            "Broadcast hall call resolved"
        );
        Some(removed)
    }

    pub fn contains(&self, floor: i32, direction: Direction) -> bool {
        self.pending.contains_key(&Target::new(floor, direction))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Currently pending keys, ordered by floor then direction name
    pub fn pending(&self) -> Vec<Target> {
        let mut keys: Vec<Target> = self.pending.iter().map(|entry| *entry.key()).collect();
        keys.sort_by_key(|t| (t.floor, t.direction.to_string()));
        keys
    }
}

impl EventSubscriber for PendingHallCalls {
    fn handle_event(&self, envelope: &EventEnvelope) -> Result<(), EventHandlerError> {
        if let DomainEvent::StopServed {
            unit_id,
            floor,
            direction,
        } = &envelope.event
        {
            self.on_served(*unit_id, *floor, *direction);
        }
        Ok(())
    }

    fn subscriber_name(&self) -> &str {
        crate::constants::system::PENDING_HALL_CALLS_SUBSCRIBER
    }
}
