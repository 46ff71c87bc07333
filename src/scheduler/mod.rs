//! # Scheduler Strategies
//!
//! Dispatch policies deciding which elevators a hall call is queued on.
//!
//! A strategy is a pure function of the requested floor and direction and a
//! read-only set of snapshots. It never mutates anything and returns an empty
//! list when no unit is eligible. Only units in `Normal` mode are eligible.
//!
//! - [`BroadcastStrategy`] hands the call to every eligible unit and relies on
//!   the pending hall-call registry to cancel the losers.
//! - [`ExclusiveEtaStrategy`] picks the single cheapest unit by distance, load
//!   and direction.

pub mod broadcast;
pub mod exclusive_eta;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::elevator::{Direction, ElevatorId, ElevatorSnapshot};

pub use broadcast::BroadcastStrategy;
pub use exclusive_eta::ExclusiveEtaStrategy;

/// Trait for dispatch policies
pub trait SchedulerStrategy: Send + Sync + fmt::Debug {
    /// Choose the units a hall call at (floor, direction) is queued on
    fn select(
        &self,
        floor: i32,
        direction: Direction,
        snapshots: &[ElevatorSnapshot],
    ) -> Vec<ElevatorId>;

    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Whether selected units race for the call and the losers must be cancelled
    fn is_broadcast(&self) -> bool {
        self.kind() == StrategyKind::Broadcast
    }
}

/// Configurable strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Broadcast,
    ExclusiveEta,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::ExclusiveEta => "exclusive_eta",
        }
    }

    /// Instantiate the strategy this kind names
    pub fn build(&self) -> Arc<dyn SchedulerStrategy> {
        match self {
            Self::Broadcast => Arc::new(BroadcastStrategy),
            Self::ExclusiveEta => Arc::new(ExclusiveEtaStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadcast" => Ok(Self::Broadcast),
            "exclusive_eta" | "eta" => Ok(Self::ExclusiveEta),
            _ => Err(format!("Invalid scheduler strategy: {s}")),
        }
    }
}
