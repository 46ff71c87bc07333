//! # Dispatch Configuration
//!
//! Construction-time configuration for the dispatch core: how many elevators
//! exist and where they start, how the command queue is sized, which scheduling
//! strategy is active at boot, and how fast the stepping driver runs.
//!
//! Values are layered by [`ConfigManager`]: compiled defaults, then an optional
//! TOML file, then `LIFT_`-prefixed environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lift_dispatch::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//! println!("{} elevators, {} workers", config.unit_count(), config.queue.worker_count);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scheduler::StrategyKind;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Fleet layout
    pub elevators: ElevatorsConfig,

    /// Command queue sizing
    pub queue: QueueConfig,

    /// Scheduling policy
    pub dispatch: StrategyConfig,

    /// Stepping driver cadence
    pub driver: DriverConfig,
}

/// Fleet layout: one entry per elevator, holding its starting floor
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ElevatorsConfig {
    pub start_floors: Vec<i32>,
}

impl Default for ElevatorsConfig {
    fn default() -> Self {
        Self {
            start_floors: vec![0, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of commands buffered before `submit` blocks
    pub capacity: usize,
    /// Number of worker threads draining the queue
    pub worker_count: usize,
    /// How often an idle worker re-checks the shutdown flag
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            worker_count: 2,
            poll_interval_ms: 50,
        }
    }
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriverConfig {
    pub step_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: 1000,
        }
    }
}

impl DriverConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

impl DispatchConfig {
    /// Number of elevators in the fleet
    pub fn unit_count(&self) -> usize {
        self.elevators.start_floors.len()
    }

    /// Convenience constructor for a fleet where every elevator starts on the same floor
    pub fn with_uniform_fleet(unit_count: usize, start_floor: i32) -> Self {
        Self {
            elevators: ElevatorsConfig {
                start_floors: vec![start_floor; unit_count],
            },
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.dispatch.strategy = strategy;
        self
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.queue.worker_count = worker_count;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue.capacity = capacity;
        self
    }

    /// Reject configurations the dispatch core cannot start with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.elevators.start_floors.is_empty() {
            return Err(ConfigurationError::validation_error(
                "at least one elevator must be configured",
            ));
        }
        if self.queue.capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.capacity",
                "0",
                "command queue capacity must be positive",
            ));
        }
        if self.queue.worker_count == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.worker_count",
                "0",
                "at least one worker thread is required",
            ));
        }
        if self.queue.poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.poll_interval_ms",
                "0",
                "poll interval must be positive",
            ));
        }
        if self.driver.step_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "driver.step_interval_ms",
                "0",
                "step interval must be positive",
            ));
        }
        Ok(())
    }
}
