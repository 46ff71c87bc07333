//! # System Constants
//!
//! Event names, cost weights and thread naming shared across the dispatch core.

/// Domain event names used in logs and serialized envelopes
pub mod events {
    pub const HALL_CALL_RAISED: &str = "hall_call.raised";
    pub const ASSIGNMENT_MADE: &str = "assignment.made";
    pub const UNIT_MOVED: &str = "unit.moved";
    pub const STOP_SERVED: &str = "stop.served";
}

/// Weights of the exclusive-ETA cost function
pub mod eta {
    /// Cost per floor of distance between the unit and the call
    pub const DISTANCE_WEIGHT: f64 = 1.0;
    /// Cost per stop already queued on the unit
    pub const QUEUED_STOP_WEIGHT: f64 = 0.5;
    /// Cost when the unit is travelling against the requested direction
    pub const DIRECTION_PENALTY_WEIGHT: f64 = 2.0;
}

/// Runtime naming
pub mod system {
    pub const WORKER_THREAD_PREFIX: &str = "lift-dispatch-worker";
    pub const DRIVER_THREAD_NAME: &str = "lift-dispatch-driver";
    pub const PENDING_HALL_CALLS_SUBSCRIBER: &str = "pending_hall_calls";
}
