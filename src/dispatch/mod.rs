//! # Dispatch
//!
//! Hall-call orchestration and cabin-call routing.

pub mod service;

pub use service::{DispatchOutcome, DispatchService};
