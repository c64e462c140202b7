#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Runs lattices on dedicated threads behind a message-passing surface.
//!
//! Each [`LatticeWorker`] owns a thread driving a [`Machine`]: commands
//! arrive over a channel, a fixed-rate timer advances the lattice and flushes
//! score, and every result travels back as an [`Event`]. Page buffers move
//! into the worker with a render request and come back inside
//! [`Event::RenderedPages`]; nothing is shared between threads.

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use snail_maze_core::{Command, Event, Variant};
use thiserror::Error;
use tracing::{debug, info};

mod directory;
mod session;

pub use directory::{visible_pages, Directory, PageLayout};
pub use session::{apply, Machine, Session};

/// Default interval between timer ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised while talking to a worker thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The worker thread has stopped and dropped its channels.
    #[error("lattice worker disconnected")]
    Disconnected,
    /// No worker runs the requested variant.
    #[error("no worker runs the {0} variant")]
    UnknownVariant(Variant),
}

/// Runtime parameters of a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Wall-clock time between timer ticks.
    pub tick_interval: Duration,
    /// Seed handed to the lattice at setup.
    pub seed: u64,
}

impl WorkerConfig {
    /// Default configuration: 100 ms ticks, seed zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            seed: 0,
        }
    }

    /// Overrides the timer interval.
    #[must_use]
    pub const fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Overrides the lattice seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a lattice running on its own thread.
#[derive(Debug)]
pub struct LatticeWorker {
    commands: Option<Sender<Command>>,
    events: Receiver<Event>,
    thread: Option<JoinHandle<()>>,
}

impl LatticeWorker {
    /// Spawns the worker thread in the uninitialized state.
    #[must_use]
    pub fn spawn(config: WorkerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (event_tx, event_rx) = mpsc::channel::<Event>();
        let thread = thread::spawn(move || run(config, &command_rx, &event_tx));
        Self {
            commands: Some(command_tx),
            events: event_rx,
            thread: Some(thread),
        }
    }

    /// Queues a command for the worker.
    pub fn send(&self, command: Command) -> Result<(), WorkerError> {
        self.commands
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(command)
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Drains every event received so far without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<Event> {
        self.events.try_iter().collect()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Event>, WorkerError> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Closes the command channel and waits for the thread to finish.
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), WorkerError> {
        drop(self.commands.take());
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| WorkerError::Disconnected),
            None => Ok(()),
        }
    }
}

impl Drop for LatticeWorker {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run(config: WorkerConfig, commands: &Receiver<Command>, events: &Sender<Event>) {
    info!(interval_ms = config.tick_interval.as_millis() as u64, "lattice worker started");
    let started = Instant::now();
    let interval = config.tick_interval.max(Duration::from_millis(1));
    let mut machine = Machine::new(config);
    let mut next_tick = started + interval;
    let mut out = Vec::new();

    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match commands.recv_timeout(timeout) {
            Ok(command) => {
                debug!(?command, "worker command");
                machine.handle(command, elapsed_micros(started), &mut out);
            }
            Err(RecvTimeoutError::Timeout) => {
                machine.on_timer(elapsed_micros(started), &mut out);
                next_tick += interval;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if out.drain(..).any(|event| events.send(event).is_err()) {
            break;
        }
    }
    info!("lattice worker stopped");
}

fn elapsed_micros(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
}
