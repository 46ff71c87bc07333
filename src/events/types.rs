use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::constants::events;
use crate::elevator::{Direction, ElevatorId};

/// Discriminant used to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    HallCallRaised,
    AssignmentMade,
    UnitMoved,
    StopServed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HallCallRaised => events::HALL_CALL_RAISED,
            Self::AssignmentMade => events::ASSIGNMENT_MADE,
            Self::UnitMoved => events::UNIT_MOVED,
            Self::StopServed => events::STOP_SERVED,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain events raised by the dispatch core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    HallCallRaised {
        floor: i32,
        direction: Direction,
    },
    AssignmentMade {
        floor: i32,
        direction: Direction,
        unit_ids: Vec<ElevatorId>,
    },
    /// `direction` is the way the car physically travelled, which can differ
    /// from the unit's reported direction while it backtracks to a stop behind it
    UnitMoved {
        unit_id: ElevatorId,
        from_floor: i32,
        to_floor: i32,
        direction: Direction,
    },
    StopServed {
        unit_id: ElevatorId,
        floor: i32,
        direction: Direction,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::HallCallRaised { .. } => EventKind::HallCallRaised,
            Self::AssignmentMade { .. } => EventKind::AssignmentMade,
            Self::UnitMoved { .. } => EventKind::UnitMoved,
            Self::StopServed { .. } => EventKind::StopServed,
        }
    }

    /// Event name for logging
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Elevator the event concerns, if it is unit-scoped
    pub fn unit_id(&self) -> Option<ElevatorId> {
        match self {
            Self::UnitMoved { unit_id, .. } | Self::StopServed { unit_id, .. } => Some(*unit_id),
            _ => None,
        }
    }
}

/// A published event with its identity and publish time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event: DomainEvent,
    pub published_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event,
            published_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// JSON rendering for diagnostics
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"serialization_error\":\"{e}\"}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_mapping() {
        let event = DomainEvent::StopServed {
            unit_id: 2,
            floor: 3,
            direction: Direction::Up,
        };
        assert_eq!(event.kind(), EventKind::StopServed);
        assert_eq!(event.event_type(), "stop.served");
        assert_eq!(event.unit_id(), Some(2));

        let event = DomainEvent::HallCallRaised {
            floor: 1,
            direction: Direction::Down,
        };
        assert_eq!(event.unit_id(), None);
    }

    #[test]
    fn test_event_serde_shape() {
        let event = DomainEvent::AssignmentMade {
            floor: 3,
            direction: Direction::Up,
            unit_ids: vec![1, 2],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "assignment_made");
        assert_eq!(json["data"]["unit_ids"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_envelopes_get_distinct_ids() {
        let event = DomainEvent::HallCallRaised {
            floor: 0,
            direction: Direction::Up,
        };
        let a = EventEnvelope::new(event.clone());
        let b = EventEnvelope::new(event);
        assert_ne!(a.event_id, b.event_id);
        assert_eq!(a.kind(), EventKind::HallCallRaised);

        let json: serde_json::Value = serde_json::from_str(&a.to_json()).unwrap();
        assert_eq!(json["event"]["type"], "hall_call_raised");
        assert_eq!(json["event_id"], a.event_id.to_string());
    }
}
