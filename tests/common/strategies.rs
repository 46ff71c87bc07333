use lift_dispatch::{Direction, ElevatorSnapshot, OperatingMode};
use proptest::prelude::*;
use std::collections::BTreeSet;

pub const MIN_FLOOR: i32 = -3;
pub const MAX_FLOOR: i32 = 20;

/// Strategy for generating floors inside a small building
pub fn floor_strategy() -> impl Strategy<Value = i32> {
    MIN_FLOOR..=MAX_FLOOR
}

/// Strategy for generating hall-call directions
pub fn hall_direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Up), Just(Direction::Down)]
}

/// Strategy for generating any direction, including idle cabin calls
pub fn any_direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Up), Just(Direction::Down), Just(Direction::Idle)]
}

/// Strategy for generating a batch of (floor, direction) stops
pub fn stops_strategy() -> impl Strategy<Value = Vec<(i32, Direction)>> {
    prop::collection::vec((floor_strategy(), any_direction_strategy()), 0..12)
}

/// Strategy for generating a snapshot of a normal-mode elevator
pub fn snapshot_strategy(id: u32) -> impl Strategy<Value = ElevatorSnapshot> {
    (
        floor_strategy(),
        prop::collection::btree_set(floor_strategy(), 0..5),
        prop::collection::btree_set(floor_strategy(), 0..5),
    )
        .prop_map(move |(floor, up, down): (i32, BTreeSet<i32>, BTreeSet<i32>)| {
            let direction = if !up.is_empty() {
                Direction::Up
            } else if !down.is_empty() {
                Direction::Down
            } else {
                Direction::Idle
            };
            ElevatorSnapshot {
                id,
                floor,
                direction,
                mode: OperatingMode::Normal,
                up_stops: up.into_iter().collect(),
                down_stops: down.into_iter().rev().collect(),
            }
        })
}

/// Strategy for generating a fleet of 1..=5 snapshots with ids 1..=n
pub fn fleet_strategy() -> impl Strategy<Value = Vec<ElevatorSnapshot>> {
    (1u32..=5).prop_flat_map(|n| {
        (1..=n)
            .map(snapshot_strategy)
            .collect::<Vec<_>>()
    })
}
