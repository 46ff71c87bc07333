use tracing::trace;

use super::{SchedulerStrategy, StrategyKind};
use crate::constants::eta::{DIRECTION_PENALTY_WEIGHT, DISTANCE_WEIGHT, QUEUED_STOP_WEIGHT};
use crate::elevator::{Direction, ElevatorId, ElevatorSnapshot};

/// Assigns each hall call to exactly one unit, the one with the lowest cost:
///
/// ```text
/// cost = |unit.floor - floor| + 0.5 * queued_stops + 2 * reversing
/// ```
///
/// where `reversing` is 1 when the unit is moving (not `Idle`) in the opposite
/// direction to the call. Candidates are scored in ascending id order and a
/// later candidate must be strictly cheaper to replace the current best, so
/// equal costs resolve to the lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExclusiveEtaStrategy;

impl ExclusiveEtaStrategy {
    pub fn cost(floor: i32, direction: Direction, snapshot: &ElevatorSnapshot) -> f64 {
        let distance = f64::from((snapshot.floor - floor).abs());
        let reversing = !snapshot.direction.is_idle() && snapshot.direction != direction;
        let penalty = if reversing { 1.0 } else { 0.0 };

        DISTANCE_WEIGHT * distance
            + QUEUED_STOP_WEIGHT * snapshot.queued_stops() as f64
            + DIRECTION_PENALTY_WEIGHT * penalty
    }
}

impl SchedulerStrategy for ExclusiveEtaStrategy {
    fn select(
        &self,
        floor: i32,
        direction: Direction,
        snapshots: &[ElevatorSnapshot],
    ) -> Vec<ElevatorId> {
        let mut candidates: Vec<&ElevatorSnapshot> = snapshots
            .iter()
            .filter(|s| s.mode.accepts_assignments())
            .collect();
        candidates.sort_by_key(|s| s.id);

        let mut best: Option<(ElevatorId, f64)> = None;
        for snapshot in candidates {
            let cost = Self::cost(floor, direction, snapshot);
            trace!(unit_id = snapshot.id, cost = cost, "Scored candidate");
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((snapshot.id, cost)),
            }
        }

        best.map(|(id, _)| vec![id]).unwrap_or_default()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ExclusiveEta
    }
}
