use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::dispatch::{DispatchOutcome, DispatchService};
use crate::elevator::{Direction, ElevatorId};
use crate::error::{DispatchError, Result};

/// A button press waiting to be applied to the dispatch service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchCommand {
    HallCall { floor: i32, direction: Direction },
    CarCall { unit_id: ElevatorId, floor: i32 },
}

impl DispatchCommand {
    pub fn hall_call(floor: i32, direction: Direction) -> Self {
        Self::HallCall { floor, direction }
    }

    pub fn car_call(unit_id: ElevatorId, floor: i32) -> Self {
        Self::CarCall { unit_id, floor }
    }

    pub fn execute(&self, service: &DispatchService) -> Result<DispatchOutcome> {
        match *self {
            Self::HallCall { floor, direction } => service.request_elevator(floor, direction),
            Self::CarCall { unit_id, floor } => service.request_car_call(unit_id, floor),
        }
    }
}

impl fmt::Display for DispatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HallCall { floor, direction } => write!(f, "hall_call({floor}, {direction})"),
            Self::CarCall { unit_id, floor } => write!(f, "car_call(unit {unit_id}, {floor})"),
        }
    }
}

/// A command in flight together with the channel its result is reported on
#[derive(Debug)]
pub(crate) struct QueuedCommand {
    pub command: DispatchCommand,
    pub reply: Sender<Result<DispatchOutcome>>,
}

/// Handle returned by `submit`, resolving to the command's result.
///
/// Dropping the ticket is fine; the command still runs.
#[derive(Debug)]
pub struct CommandTicket {
    command: DispatchCommand,
    receiver: Receiver<Result<DispatchOutcome>>,
}

impl CommandTicket {
    pub(crate) fn new(command: DispatchCommand, receiver: Receiver<Result<DispatchOutcome>>) -> Self {
        Self { command, receiver }
    }

    pub fn command(&self) -> DispatchCommand {
        self.command
    }

    /// Block until the command has run. A command abandoned at shutdown
    /// resolves to `QueueShutdown`.
    pub fn wait(self) -> Result<DispatchOutcome> {
        self.receiver
            .recv()
            .unwrap_or(Err(DispatchError::QueueShutdown))
    }

    /// Like `wait`, but gives up after `timeout` and returns `None`
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<DispatchOutcome>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(DispatchError::QueueShutdown)),
        }
    }
}
