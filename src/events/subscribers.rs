use tracing::{debug, info};

use super::bus::{EventHandlerError, EventSubscriber};
use super::types::{DomainEvent, EventEnvelope};

/// Writes every domain event to the tracing pipeline.
///
/// This is the presentation-side subscriber: assignments and served stops are
/// logged at `info`, motion at `debug`.
#[derive(Debug, Default)]
pub struct LoggingSubscriber;

impl LoggingSubscriber {
    pub const NAME: &'static str = "logging_subscriber";

    pub fn new() -> Self {
        Self
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn handle_event(&self, envelope: &EventEnvelope) -> Result<(), EventHandlerError> {
        match &envelope.event {
            DomainEvent::HallCallRaised { floor, direction } => {
                info!(
                    event_id = %envelope.event_id,
                    floor = floor,
                    direction = %direction,
                    "🔔 HALL_CALL_RAISED"
                );
            }
            DomainEvent::AssignmentMade {
                floor,
                direction,
                unit_ids,
            } => {
                info!(
                    event_id = %envelope.event_id,
                    floor = floor,
                    direction = %direction,
                    unit_ids = ?unit_ids,
                    "📋 ASSIGNMENT_MADE"
                );
            }
            DomainEvent::UnitMoved {
                unit_id,
                from_floor,
                to_floor,
                direction,
            } => {
                debug!(
                    unit_id = unit_id,
                    from_floor = from_floor,
                    to_floor = to_floor,
                    direction = %direction,
                    "UNIT_MOVED"
                );
            }
            DomainEvent::StopServed {
                unit_id,
                floor,
                direction,
            } => {
                info!(
                    event_id = %envelope.event_id,
                    unit_id = unit_id,
                    floor = floor,
                    direction = %direction,
                    "✅ STOP_SERVED"
                );
            }
        }
        Ok(())
    }

    fn subscriber_name(&self) -> &str {
        Self::NAME
    }
}
