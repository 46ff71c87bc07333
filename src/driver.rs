//! # Stepping Driver
//!
//! Background thread that advances every elevator by one floor on a fixed
//! interval. Event subscribers, including pending hall-call reconciliation, run
//! on this thread as part of each step.

use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace};

use crate::constants::system::DRIVER_THREAD_NAME;
use crate::error::{DispatchError, Result};
use crate::registry::ElevatorRegistry;

pub struct StepDriver {
    stop: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    steps: Arc<AtomicU64>,
    interval: Duration,
}

impl StepDriver {
    pub fn start(registry: Arc<ElevatorRegistry>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let steps = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&steps);

        let handle = thread::Builder::new()
            .name(DRIVER_THREAD_NAME.to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "Stepping driver started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let events = registry.step_all();
                            let step = counter.fetch_add(1, Ordering::Relaxed) + 1;
                            trace!(step = step, events = events.len(), "Fleet stepped");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Stepping driver stopped");
            })
            .map_err(|e| DispatchError::worker_spawn(DRIVER_THREAD_NAME, &e))?;

        info!(interval_ms = interval.as_millis() as u64, "Stepping driver running");

        Ok(Self {
            stop: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(Some(handle)),
            steps,
            interval,
        })
    }

    /// Stop the driver and wait for the thread to exit. Safe to call repeatedly.
    pub fn stop(&self) {
        // Dropping the sender disconnects the channel and wakes the thread
        drop(self.stop.lock().take());

        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                error!("Stepping driver terminated abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Completed fleet steps
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for StepDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
