use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable elevator identity, assigned at construction and never reused
pub type ElevatorId = u32;

/// Travel direction of an elevator, or the requested direction of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    /// No pending work; also the direction of cabin calls, which carry no hall direction
    Idle,
}

impl Direction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Hall calls may only be raised for a concrete direction
    pub fn is_hall_direction(&self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Direction of physical travel between two floors
    pub fn of_travel(from_floor: i32, to_floor: i32) -> Self {
        match to_floor.cmp(&from_floor) {
            std::cmp::Ordering::Greater => Self::Up,
            std::cmp::Ordering::Less => Self::Down,
            std::cmp::Ordering::Equal => Self::Idle,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "idle" => Ok(Self::Idle),
            _ => Err(format!("Invalid direction: {s}")),
        }
    }
}

/// Operating mode; anything other than `Normal` removes the unit from new assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    Normal,
    Maintenance,
    OutOfService,
}

impl OperatingMode {
    /// Whether the unit may receive new hall-call assignments
    pub fn accepts_assignments(&self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl Default for OperatingMode {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::OutOfService => write!(f, "out_of_service"),
        }
    }
}

impl std::str::FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "maintenance" => Ok(Self::Maintenance),
            "out_of_service" => Ok(Self::OutOfService),
            _ => Err(format!("Invalid operating mode: {s}")),
        }
    }
}

/// One requested stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub floor: i32,
    pub direction: Direction,
}

impl Target {
    pub fn new(floor: i32, direction: Direction) -> Self {
        Self { floor, direction }
    }

    /// A cabin stop, which has no hall direction
    pub fn cabin(floor: i32) -> Self {
        Self::new(floor, Direction::Idle)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.floor, self.direction)
    }
}

/// Point-in-time copy of one elevator, taken under its lock.
///
/// Snapshots across units taken by the same `snapshot_all` call are not
/// mutually consistent; schedulers treat them as slightly stale by nature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevatorSnapshot {
    pub id: ElevatorId,
    pub floor: i32,
    pub direction: Direction,
    pub mode: OperatingMode,
    /// Ascending
    pub up_stops: Vec<i32>,
    /// Descending
    pub down_stops: Vec<i32>,
}

impl ElevatorSnapshot {
    pub fn queued_stops(&self) -> usize {
        self.up_stops.len() + self.down_stops.len()
    }

    pub fn is_idle(&self) -> bool {
        self.direction.is_idle()
    }
}

impl fmt::Display for ElevatorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "elevator {} | floor {:>3} | {:<4} | {:<14} | up {:?} | down {:?}",
            self.id,
            self.floor,
            self.direction.to_string(),
            self.mode.to_string(),
            self.up_stops,
            self.down_stops
        )
    }
}
