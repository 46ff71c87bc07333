//! # Elevator Registry
//!
//! Owns every elevator unit and exposes the fleet-wide operations used by the
//! dispatch service, the pending hall-call registry and the stepping driver.
//!
//! The fleet is fixed at construction: units are never added or removed
//! afterwards, so the map itself needs no lock. Each fleet operation visits
//! units in ascending id order and takes each unit's own lock independently;
//! results spanning several units (such as `snapshot_all`) are therefore not a
//! globally consistent view.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::elevator::{Direction, ElevatorId, ElevatorSnapshot, ElevatorUnit, OperatingMode, Target};
use crate::error::{DispatchError, Result};
use crate::events::{DomainEvent, EventBus};

#[derive(Debug)]
pub struct ElevatorRegistry {
    units: BTreeMap<ElevatorId, Arc<ElevatorUnit>>,
}

impl ElevatorRegistry {
    /// Build a fleet with ids `1..=start_floors.len()`
    pub fn new(start_floors: &[i32], bus: Arc<EventBus>) -> Self {
        let units = start_floors
            .iter()
            .zip(1..)
            .map(|(&floor, id)| (id, Arc::new(ElevatorUnit::new(id, floor, Arc::clone(&bus)))))
            .collect::<BTreeMap<_, _>>();

        info!(units = units.len(), "Elevator registry initialized");
        Self { units }
    }

    pub fn get(&self, unit_id: ElevatorId) -> Result<Arc<ElevatorUnit>> {
        self.units
            .get(&unit_id)
            .cloned()
            .ok_or(DispatchError::UnknownElevator { unit_id })
    }

    pub fn ids(&self) -> Vec<ElevatorId> {
        self.units.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Queue `target` on one unit. Returns whether the stop was newly added.
    pub fn add_to_target_queue(&self, unit_id: ElevatorId, target: Target) -> Result<bool> {
        let unit = self.get(unit_id)?;
        Ok(unit.enqueue_target(target))
    }

    /// Withdraw the hall request (floor, direction) from every unit except the
    /// one that served it. Cabin requests for the floor stay queued.
    /// Returns how many units had the hall request.
    pub fn remove_for_others(
        &self,
        serving_unit_id: ElevatorId,
        floor: i32,
        direction: Direction,
    ) -> usize {
        let removed = self
            .units
            .values()
            .filter(|unit| unit.id() != serving_unit_id)
            .filter(|unit| unit.remove_stop(floor, direction))
            .count();

        debug!(
            serving_unit_id = serving_unit_id,
            floor = floor,
            direction = %direction,
            removed = removed,
            "Removed resolved stop from other units"
        );
        removed
    }

    /// One snapshot per unit, ascending id order
    pub fn snapshot_all(&self) -> Vec<ElevatorSnapshot> {
        self.units.values().map(|unit| unit.snapshot()).collect()
    }

    /// Step every unit once; returns every event the step produced
    pub fn step_all(&self) -> Vec<DomainEvent> {
        self.units
            .values()
            .flat_map(|unit| unit.step_one())
            .collect()
    }

    pub fn set_mode(&self, unit_id: ElevatorId, mode: OperatingMode) -> Result<OperatingMode> {
        Ok(self.get(unit_id)?.set_mode(mode))
    }
}
