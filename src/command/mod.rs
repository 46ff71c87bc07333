//! # Command Queue
//!
//! Asynchronous hall-call and cabin-call submission backed by a fixed pool of
//! worker threads.

pub mod queue;
pub mod types;

pub use queue::{CommandQueue, CommandQueueStats};
pub use types::{CommandTicket, DispatchCommand};
