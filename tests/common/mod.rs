#![allow(dead_code, unused_imports)]

pub mod recorder;
pub mod strategies;

pub use recorder::*;
pub use strategies::*;

use lift_dispatch::{DispatchConfig, ElevatorSystem, StrategyKind};

/// Start a system with `units` elevators on floor 0 and a single queue worker
pub fn single_worker_system(units: usize, strategy: StrategyKind) -> ElevatorSystem {
    let config = DispatchConfig::with_uniform_fleet(units, 0)
        .with_strategy(strategy)
        .with_workers(1);
    ElevatorSystem::new(&config).expect("system should start")
}
