//! # Command Queue
//!
//! Decouples the threads that detect button presses from the threads that
//! mutate dispatch and elevator state.
//!
//! ## Architecture
//!
//! ```text
//! callers ──submit()──→ bounded channel ──→ worker 0 ─┐
//!                                      ├──→ worker 1 ─┼─→ DispatchService
//!                                      └──→ worker N ─┘
//! ```
//!
//! - `submit` blocks while the queue is full; `try_submit` fails fast instead.
//! - Each worker handles its own commands in FIFO order. With more than one
//!   worker, commands from different callers may run in any interleaving.
//! - Every command runs behind its own error boundary: a failing or panicking
//!   command is reported through its ticket and the worker moves on.
//! - `shutdown` is cooperative and idempotent. Workers stop polling and exit;
//!   commands still queued are abandoned and their tickets resolve to
//!   `QueueShutdown`.
//! - Submitters hold a read guard on the submission gate from the shutdown
//!   check until their command is in the channel. `shutdown` drains only after
//!   taking the write guard, so no command can land in the channel after the
//!   final drain.

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::types::{CommandTicket, DispatchCommand, QueuedCommand};
use crate::config::QueueConfig;
use crate::constants::system::WORKER_THREAD_PREFIX;
use crate::dispatch::{DispatchOutcome, DispatchService};
use crate::error::{DispatchError, Result};
use crate::events::bus::panic_message;

/// Queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandQueueStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    /// Hall calls that ran but found no eligible elevator
    pub dropped_calls: u64,
    /// Commands discarded at shutdown without running
    pub abandoned: u64,
    /// Commands currently waiting in the channel
    pub queued: usize,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    dropped_calls: AtomicU64,
    abandoned: AtomicU64,
}

pub struct CommandQueue {
    sender: Sender<QueuedCommand>,
    /// Kept so `shutdown` can drain whatever the workers left behind
    receiver: Receiver<QueuedCommand>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    submission_gate: RwLock<()>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<Counters>,
    capacity: usize,
    worker_count: usize,
    poll_interval: Duration,
}

impl CommandQueue {
    /// Start `config.worker_count` workers draining a queue of `config.capacity`
    pub fn start(config: &QueueConfig, service: Arc<DispatchService>) -> Result<Self> {
        if config.capacity == 0 || config.worker_count == 0 {
            return Err(DispatchError::ConfigurationError(format!(
                "command queue needs positive capacity and worker count (capacity {}, workers {})",
                config.capacity, config.worker_count
            )));
        }

        let (sender, receiver) = bounded(config.capacity);
        let shutdown = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());
        let poll_interval = config.poll_interval();

        let mut workers = Vec::with_capacity(config.worker_count);
        for index in 0..config.worker_count {
            let worker = Worker {
                index,
                receiver: receiver.clone(),
                service: Arc::clone(&service),
                shutdown: Arc::clone(&shutdown),
                counters: Arc::clone(&counters),
                poll_interval,
            };
            let name = format!("{WORKER_THREAD_PREFIX}-{index}");
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Release the workers that did start before reporting
                    shutdown.store(true, Ordering::SeqCst);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(DispatchError::worker_spawn(name, &e));
                }
            }
        }

        info!(
            capacity = config.capacity,
            workers = config.worker_count,
            "Command queue started"
        );

        Ok(Self {
            sender,
            receiver,
            workers: Mutex::new(workers),
            submission_gate: RwLock::new(()),
            shutdown,
            counters,
            capacity: config.capacity,
            worker_count: config.worker_count,
            poll_interval,
        })
    }

    /// Enqueue a command, blocking while the queue is full
    pub fn submit(&self, command: DispatchCommand) -> Result<CommandTicket> {
        let _gate = self.submission_gate.read();
        let (queued, ticket) = self.prepare(command)?;

        let mut pending = queued;
        loop {
            match self.sender.send_timeout(pending, self.poll_interval) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(returned)) => {
                    if self.is_shutdown() {
                        return Err(DispatchError::QueueShutdown);
                    }
                    pending = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(DispatchError::QueueShutdown),
            }
        }

        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(command = %command, "Command submitted");
        Ok(ticket)
    }

    /// Enqueue a command without blocking
    pub fn try_submit(&self, command: DispatchCommand) -> Result<CommandTicket> {
        let _gate = self.submission_gate.read();
        let (queued, ticket) = self.prepare(command)?;

        match self.sender.try_send(queued) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                debug!(command = %command, "Command submitted");
                Ok(ticket)
            }
            Err(TrySendError::Full(_)) => Err(DispatchError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(DispatchError::QueueShutdown),
        }
    }

    fn prepare(&self, command: DispatchCommand) -> Result<(QueuedCommand, CommandTicket)> {
        if self.is_shutdown() {
            return Err(DispatchError::QueueShutdown);
        }
        let (reply, receiver) = bounded(1);
        Ok((
            QueuedCommand { command, reply },
            CommandTicket::new(command, receiver),
        ))
    }

    /// Stop the workers and abandon anything still queued. Safe to call repeatedly.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        // Blocked submitters see the flag on their next send timeout and back out
        let _gate = self.submission_gate.write();

        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                error!("Command queue worker terminated abnormally");
            }
        }

        let mut abandoned = 0u64;
        while let Ok(queued) = self.receiver.try_recv() {
            debug!(command = %queued.command, "Command abandoned at shutdown");
            abandoned += 1;
        }
        self.counters.abandoned.fetch_add(abandoned, Ordering::Relaxed);

        if abandoned > 0 {
            warn!(abandoned = abandoned, "Command queue shut down with pending commands");
        }
        info!("Command queue shut down");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Commands waiting to be picked up
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn stats(&self) -> CommandQueueStats {
        CommandQueueStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped_calls: self.counters.dropped_calls.load(Ordering::Relaxed),
            abandoned: self.counters.abandoned.load(Ordering::Relaxed),
            queued: self.pending(),
        }
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("capacity", &self.capacity)
            .field("worker_count", &self.worker_count)
            .field("shutdown", &self.is_shutdown())
            .field("stats", &self.stats())
            .finish()
    }
}

struct Worker {
    index: usize,
    receiver: Receiver<QueuedCommand>,
    service: Arc<DispatchService>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<Counters>,
    poll_interval: Duration,
}

impl Worker {
    fn run(self) {
        debug!(worker = self.index, "Command worker started");
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.receiver.recv_timeout(self.poll_interval) {
                Ok(queued) => self.process(queued),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(worker = self.index, "Command worker stopped");
    }

    fn process(&self, queued: QueuedCommand) {
        let QueuedCommand { command, reply } = queued;
        let service = &self.service;

        let result = panic::catch_unwind(AssertUnwindSafe(|| command.execute(service)))
            .unwrap_or_else(|payload| {
                Err(DispatchError::CommandPanicked {
                    command: command.to_string(),
                    reason: panic_message(payload.as_ref()),
                })
            });

        match &result {
            Ok(outcome) => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                if *outcome == DispatchOutcome::Dropped {
                    self.counters.dropped_calls.fetch_add(1, Ordering::Relaxed);
                }
                debug!(worker = self.index, command = %command, outcome = ?outcome, "Command executed");
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(worker = self.index, command = %command, error = %e, "Command failed");
            }
        }

        // The caller may have dropped its ticket
        let _ = reply.send(result);
    }
}
