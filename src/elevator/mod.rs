//! # Elevator
//!
//! Elevator units, their snapshots, and the value types shared by every other
//! layer (direction, operating mode, stop targets).

pub mod types;
pub mod unit;

pub use types::{Direction, ElevatorId, ElevatorSnapshot, OperatingMode, Target};
pub use unit::ElevatorUnit;
