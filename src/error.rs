//! Error types for the dispatch core.
//!

use crate::config::ConfigurationError;
use crate::elevator::{Direction, ElevatorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Unknown elevator: {unit_id}")]
    UnknownElevator { unit_id: ElevatorId },
    #[error("Invalid hall call direction {direction} for floor {floor}")]
    InvalidDirection { floor: i32, direction: Direction },
    #[error("Command queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
    #[error("Command queue has been shut down")]
    QueueShutdown,
    #[error("Command {command} panicked: {reason}")]
    CommandPanicked { command: String, reason: String },
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Failed to spawn thread {thread}: {reason}")]
    WorkerSpawn { thread: String, reason: String },
}

impl DispatchError {
    pub fn worker_spawn(thread: impl Into<String>, error: &std::io::Error) -> Self {
        Self::WorkerSpawn {
            thread: thread.into(),
            reason: error.to_string(),
        }
    }
}

impl From<ConfigurationError> for DispatchError {
    fn from(error: ConfigurationError) -> Self {
        DispatchError::ConfigurationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
