//! # Event Recorder
//!
//! Captures every domain event published on a bus so integration tests can
//! assert on what happened, in order.

use lift_dispatch::{DomainEvent, Direction, ElevatorId, EventBus, EventKind};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<DomainEvent>>,
}

impl EventRecorder {
    /// Subscribe a fresh recorder to every event kind on `bus`
    pub fn attach(bus: &EventBus) -> Arc<Self> {
        let recorder = Arc::new(Self::default());
        let sink = Arc::clone(&recorder);
        bus.subscribe_fn("test_recorder", &[], move |envelope| {
            sink.events.lock().push(envelope.event.clone());
            Ok(())
        });
        recorder
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<DomainEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.of_kind(kind).len()
    }

    /// Units that served `floor` in `direction`, in the order they did it
    pub fn served_by(&self, floor: i32, direction: Direction) -> Vec<ElevatorId> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match *e {
                DomainEvent::StopServed {
                    unit_id,
                    floor: f,
                    direction: d,
                } if f == floor && d == direction => Some(unit_id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
