use super::{SchedulerStrategy, StrategyKind};
use crate::elevator::{Direction, ElevatorId, ElevatorSnapshot};

/// Sends every hall call to all units in `Normal` mode, regardless of distance
/// or direction. The first unit to serve it wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastStrategy;

impl SchedulerStrategy for BroadcastStrategy {
    fn select(
        &self,
        _floor: i32,
        _direction: Direction,
        snapshots: &[ElevatorSnapshot],
    ) -> Vec<ElevatorId> {
        snapshots
            .iter()
            .filter(|s| s.mode.accepts_assignments())
            .map(|s| s.id)
            .collect()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Broadcast
    }
}
