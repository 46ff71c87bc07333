//! # Elevator Unit
//!
//! One elevator's physical state and its one-floor-at-a-time state machine.
//!
//! ## Locking
//!
//! Floor, direction, mode and both stop sets live behind a single unit-local
//! `parking_lot::Mutex`. Every read and write goes through it, so two different
//! units never contend. A step computes its state change and the events it
//! produced under the lock, then publishes those events after releasing it:
//! subscribers (the pending hall-call registry in particular) take other units'
//! locks and must never run while this one is held.
//!
//! ## Stepping rules
//!
//! Up-stops always win over down-stops. The reported direction names the stop
//! set currently being worked and is recomputed after every mutation, so it is
//! `Up` only while up-stops exist, `Down` only while up-stops are empty and
//! down-stops are not, and `Idle` only when both are empty.
//!
//! Within the active set the unit aims at the nearest stop ahead of it (the
//! smallest up-stop at or above the floor, the largest down-stop at or below
//! it). If every stop in the set lies behind the unit it aims at the closest of
//! those instead. A stop on the current floor is served without moving.
//!
//! ## Stop origins
//!
//! Each queued floor remembers whether a hall call, a cabin call or both asked
//! for it. Broadcast reconciliation only withdraws the hall part, so a
//! passenger's own stop survives another unit answering the same hall call.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::types::{Direction, ElevatorId, ElevatorSnapshot, OperatingMode, Target};
use crate::events::{DomainEvent, EventBus};

/// Who asked for a queued stop. A floor can carry both at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StopOrigin {
    hall: bool,
    cabin: bool,
}

type StopSet = BTreeMap<i32, StopOrigin>;

fn mark_hall(set: &mut StopSet, floor: i32) -> bool {
    !std::mem::replace(&mut set.entry(floor).or_default().hall, true)
}

/// Clear the hall request at `floor`, keeping the stop if a passenger asked for it
fn clear_hall(set: &mut StopSet, floor: i32) -> bool {
    match set.get_mut(&floor) {
        Some(origin) if origin.hall => {
            origin.hall = false;
            if !origin.cabin {
                set.remove(&floor);
            }
            true
        }
        _ => false,
    }
}

#[derive(Debug)]
struct UnitState {
    floor: i32,
    direction: Direction,
    mode: OperatingMode,
    up_stops: StopSet,
    down_stops: StopSet,
}

impl UnitState {
    fn refresh_direction(&mut self) {
        self.direction = if !self.up_stops.is_empty() {
            Direction::Up
        } else if !self.down_stops.is_empty() {
            Direction::Down
        } else {
            Direction::Idle
        };
    }

    fn enqueue(&mut self, floor: i32, direction: Direction) -> bool {
        let inserted = match direction {
            Direction::Up => mark_hall(&mut self.up_stops, floor),
            Direction::Down => mark_hall(&mut self.down_stops, floor),
            Direction::Idle => {
                if let Some(origin) = self.up_stops.get_mut(&floor) {
                    !std::mem::replace(&mut origin.cabin, true)
                } else if let Some(origin) = self.down_stops.get_mut(&floor) {
                    !std::mem::replace(&mut origin.cabin, true)
                } else {
                    let set = if floor >= self.floor {
                        &mut self.up_stops
                    } else {
                        &mut self.down_stops
                    };
                    set.insert(floor, StopOrigin { hall: false, cabin: true });
                    true
                }
            }
        };
        self.refresh_direction();
        inserted
    }

    fn remove_stop(&mut self, floor: i32, direction: Direction) -> bool {
        let removed = match direction {
            Direction::Up => clear_hall(&mut self.up_stops, floor),
            Direction::Down => clear_hall(&mut self.down_stops, floor),
            Direction::Idle => {
                let up = self.up_stops.remove(&floor).is_some();
                let down = self.down_stops.remove(&floor).is_some();
                up || down
            }
        };
        self.refresh_direction();
        removed
    }

    /// Pop the stop at `floor` from the active set. A passenger bound for this
    /// floor gets off too, even if the cabin request sits in the other set.
    fn serve(&mut self, floor: i32, active: Direction) {
        let (served, other) = match active {
            Direction::Up => (&mut self.up_stops, &mut self.down_stops),
            _ => (&mut self.down_stops, &mut self.up_stops),
        };
        served.remove(&floor);
        if let Some(origin) = other.get_mut(&floor) {
            origin.cabin = false;
            if !origin.hall {
                other.remove(&floor);
            }
        }
    }

    /// Next floor to head for within the up-stop set
    fn up_aim(&self) -> Option<i32> {
        self.up_stops
            .range(self.floor..)
            .next()
            .or_else(|| self.up_stops.iter().next_back())
            .map(|(&floor, _)| floor)
    }

    /// Next floor to head for within the down-stop set
    fn down_aim(&self) -> Option<i32> {
        self.down_stops
            .range(..=self.floor)
            .next_back()
            .or_else(|| self.down_stops.iter().next())
            .map(|(&floor, _)| floor)
    }

    fn advance(&mut self, unit_id: ElevatorId) -> Vec<DomainEvent> {
        let (aim, active) = if let Some(aim) = self.up_aim() {
            (aim, Direction::Up)
        } else if let Some(aim) = self.down_aim() {
            (aim, Direction::Down)
        } else {
            self.direction = Direction::Idle;
            return Vec::new();
        };
        self.direction = active;

        let mut events = Vec::with_capacity(2);
        if aim != self.floor {
            let from_floor = self.floor;
            self.floor += (aim - self.floor).signum();
            events.push(DomainEvent::UnitMoved {
                unit_id,
                from_floor,
                to_floor: self.floor,
                direction: Direction::of_travel(from_floor, self.floor),
            });
        }

        if self.floor == aim {
            self.serve(aim, active);
            events.push(DomainEvent::StopServed {
                unit_id,
                floor: aim,
                direction: active,
            });
            self.refresh_direction();
        }

        events
    }

    fn snapshot(&self, id: ElevatorId) -> ElevatorSnapshot {
        ElevatorSnapshot {
            id,
            floor: self.floor,
            direction: self.direction,
            mode: self.mode,
            up_stops: self.up_stops.keys().copied().collect(),
            down_stops: self.down_stops.keys().rev().copied().collect(),
        }
    }
}

/// A single elevator
#[derive(Debug)]
pub struct ElevatorUnit {
    id: ElevatorId,
    state: Mutex<UnitState>,
    bus: Arc<EventBus>,
}

impl ElevatorUnit {
    pub fn new(id: ElevatorId, start_floor: i32, bus: Arc<EventBus>) -> Self {
        debug!(unit_id = id, start_floor = start_floor, "Elevator unit created");
        Self {
            id,
            state: Mutex::new(UnitState {
                floor: start_floor,
                direction: Direction::Idle,
                mode: OperatingMode::Normal,
                up_stops: StopSet::new(),
                down_stops: StopSet::new(),
            }),
            bus,
        }
    }

    pub fn id(&self) -> ElevatorId {
        self.id
    }

    /// Queue a stop. Returns `false` when the stop was already queued.
    pub fn enqueue(&self, floor: i32, direction: Direction) -> bool {
        let inserted = self.state.lock().enqueue(floor, direction);
        trace!(
            unit_id = self.id,
            floor = floor,
            direction = %direction,
            inserted = inserted,
            "Stop enqueued"
        );
        inserted
    }

    pub fn enqueue_target(&self, target: Target) -> bool {
        self.enqueue(target.floor, target.direction)
    }

    /// Withdraw a hall request for (floor, direction). A cabin request for the
    /// same floor keeps the stop queued. `Idle` removes the floor outright.
    pub fn remove_stop(&self, floor: i32, direction: Direction) -> bool {
        let removed = self.state.lock().remove_stop(floor, direction);
        if removed {
            debug!(
                unit_id = self.id,
                floor = floor,
                direction = %direction,
                "Stop removed"
            );
        }
        removed
    }

    /// Advance exactly one floor (or serve a stop in place) and publish the
    /// resulting events. Returns the events that were published.
    pub fn step_one(&self) -> Vec<DomainEvent> {
        let events = self.state.lock().advance(self.id);
        for event in &events {
            self.bus.publish(event.clone());
        }
        events
    }

    pub fn snapshot(&self) -> ElevatorSnapshot {
        self.state.lock().snapshot(self.id)
    }

    pub fn floor(&self) -> i32 {
        self.state.lock().floor
    }

    pub fn direction(&self) -> Direction {
        self.state.lock().direction
    }

    pub fn mode(&self) -> OperatingMode {
        self.state.lock().mode
    }

    /// Change the operating mode, returning the previous one. Queued stops are kept.
    pub fn set_mode(&self, mode: OperatingMode) -> OperatingMode {
        let previous = std::mem::replace(&mut self.state.lock().mode, mode);
        if previous != mode {
            info!(
                unit_id = self.id,
                from = %previous,
                to = %mode,
                "Operating mode changed"
            );
        }
        previous
    }

    pub fn has_stop(&self, floor: i32, direction: Direction) -> bool {
        let state = self.state.lock();
        match direction {
            Direction::Up => state.up_stops.contains_key(&floor),
            Direction::Down => state.down_stops.contains_key(&floor),
            Direction::Idle => {
                state.up_stops.contains_key(&floor) || state.down_stops.contains_key(&floor)
            }
        }
    }

    /// Whether a passenger inside this unit is waiting to reach `floor`
    pub fn has_cabin_stop(&self, floor: i32) -> bool {
        let state = self.state.lock();
        [&state.up_stops, &state.down_stops]
            .iter()
            .any(|set| set.get(&floor).is_some_and(|origin| origin.cabin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn unit_at(floor: i32) -> ElevatorUnit {
        ElevatorUnit::new(1, floor, Arc::new(EventBus::new()))
    }

    #[test]
    fn test_idle_unit_does_not_move() {
        let unit = unit_at(4);
        assert!(unit.step_one().is_empty());
        assert_eq!(unit.floor(), 4);
        assert_eq!(unit.direction(), Direction::Idle);
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let unit = unit_at(0);
        assert!(unit.enqueue(3, Direction::Up));
        assert!(!unit.enqueue(3, Direction::Up));
        assert_eq!(unit.snapshot().up_stops, vec![3]);
    }

    #[test]
    fn test_steps_up_and_serves_smallest_stop_first() {
        let unit = unit_at(0);
        unit.enqueue(2, Direction::Up);
        unit.enqueue(1, Direction::Up);

        let events = unit.step_one();
        assert_eq!(
            events,
            vec![
                DomainEvent::UnitMoved {
                    unit_id: 1,
                    from_floor: 0,
                    to_floor: 1,
                    direction: Direction::Up
                },
                DomainEvent::StopServed {
                    unit_id: 1,
                    floor: 1,
                    direction: Direction::Up
                },
            ]
        );
        assert_eq!(unit.snapshot().up_stops, vec![2]);
        assert_eq!(unit.direction(), Direction::Up);

        unit.step_one();
        assert_eq!(unit.floor(), 2);
        assert_eq!(unit.direction(), Direction::Idle);
    }

    #[test]
    fn test_up_stops_take_priority_over_down_stops() {
        let unit = unit_at(5);
        unit.enqueue(3, Direction::Down);
        unit.enqueue(7, Direction::Up);

        let first = unit.step_one();
        assert_eq!(first[0].kind(), EventKind::UnitMoved);
        assert_eq!(unit.floor(), 6);
        assert_eq!(unit.direction(), Direction::Up);

        unit.step_one();
        assert_eq!(unit.floor(), 7);
        assert_eq!(unit.direction(), Direction::Down);

        for _ in 0..4 {
            unit.step_one();
        }
        assert_eq!(unit.floor(), 3);
        assert_eq!(unit.direction(), Direction::Idle);
    }

    #[test]
    fn test_down_stops_served_largest_first() {
        let unit = unit_at(6);
        unit.enqueue(2, Direction::Down);
        unit.enqueue(4, Direction::Down);
        assert_eq!(unit.snapshot().down_stops, vec![4, 2]);

        unit.step_one();
        let events = unit.step_one();
        assert!(events.contains(&DomainEvent::StopServed {
            unit_id: 1,
            floor: 4,
            direction: Direction::Down
        }));
        assert_eq!(unit.snapshot().down_stops, vec![2]);
    }

    #[test]
    fn test_stop_on_current_floor_is_served_in_place() {
        let unit = unit_at(3);
        unit.enqueue(3, Direction::Up);
        let events = unit.step_one();
        assert_eq!(
            events,
            vec![DomainEvent::StopServed {
                unit_id: 1,
                floor: 3,
                direction: Direction::Up
            }]
        );
        assert_eq!(unit.floor(), 3);
    }

    #[test]
    fn test_up_stop_below_unit_is_reached() {
        let unit = unit_at(5);
        unit.enqueue(2, Direction::Up);

        let mut served = false;
        for _ in 0..3 {
            served |= unit
                .step_one()
                .iter()
                .any(|e| e.kind() == EventKind::StopServed);
            assert_eq!(unit.snapshot().down_stops, Vec::<i32>::new());
        }
        assert!(served);
        assert_eq!(unit.floor(), 2);
        assert_eq!(unit.direction(), Direction::Idle);
    }

    #[test]
    fn test_cabin_call_bucketed_by_relative_floor() {
        let unit = unit_at(4);
        unit.enqueue(6, Direction::Idle);
        unit.enqueue(1, Direction::Idle);
        unit.enqueue(4, Direction::Idle);

        let snapshot = unit.snapshot();
        assert_eq!(snapshot.up_stops, vec![4, 6]);
        assert_eq!(snapshot.down_stops, vec![1]);

        // Already queued in one set, so not duplicated into the other
        assert!(!unit.enqueue(6, Direction::Idle));
        assert!(unit.has_cabin_stop(6));
        assert!(!unit.has_cabin_stop(5));
    }

    #[test]
    fn test_hall_withdrawal_keeps_cabin_stop() {
        let unit = unit_at(0);
        unit.enqueue(3, Direction::Idle);
        assert!(unit.enqueue(3, Direction::Up));

        assert!(unit.remove_stop(3, Direction::Up));
        assert_eq!(unit.snapshot().up_stops, vec![3]);
        assert_eq!(unit.direction(), Direction::Up);
        assert!(unit.has_cabin_stop(3));

        // Nothing left to withdraw
        assert!(!unit.remove_stop(3, Direction::Up));
    }

    #[test]
    fn test_serving_floor_delivers_cabin_request_in_other_set() {
        let unit = unit_at(5);
        unit.enqueue(3, Direction::Idle);
        unit.enqueue(3, Direction::Up);
        assert_eq!(unit.snapshot().down_stops, vec![3]);

        for _ in 0..2 {
            unit.step_one();
        }
        assert_eq!(unit.floor(), 3);
        assert!(!unit.has_cabin_stop(3));
        assert_eq!(unit.snapshot().queued_stops(), 0);
        assert_eq!(unit.direction(), Direction::Idle);
    }

    #[test]
    fn test_backtracking_move_reports_travel_direction() {
        let unit = unit_at(5);
        unit.enqueue(3, Direction::Up);

        let events = unit.step_one();
        assert_eq!(
            events,
            vec![DomainEvent::UnitMoved {
                unit_id: 1,
                from_floor: 5,
                to_floor: 4,
                direction: Direction::Down
            }]
        );
        assert_eq!(unit.direction(), Direction::Up);
    }

    #[test]
    fn test_remove_stop_is_idempotent() {
        let unit = unit_at(0);
        unit.enqueue(3, Direction::Up);
        assert!(unit.remove_stop(3, Direction::Up));
        assert!(!unit.remove_stop(3, Direction::Up));
        assert_eq!(unit.direction(), Direction::Idle);
    }

    #[test]
    fn test_step_publishes_on_bus() {
        let bus = Arc::new(EventBus::new());
        let unit = ElevatorUnit::new(9, 0, Arc::clone(&bus));
        unit.enqueue(1, Direction::Up);
        unit.step_one();
        assert_eq!(bus.stats().events_published, 2);
    }

    #[test]
    fn test_mode_change_keeps_stops() {
        let unit = unit_at(0);
        unit.enqueue(2, Direction::Up);
        assert_eq!(unit.set_mode(OperatingMode::Maintenance), OperatingMode::Normal);
        assert_eq!(unit.mode(), OperatingMode::Maintenance);
        assert!(unit.has_stop(2, Direction::Up));
    }
}
