//! Transports between the controller and the generation worker.
//!
//! [`ThreadedTransport`] runs a [`WorkerCore`] on a dedicated thread that
//! ticks at the frame rate and talks over crossbeam channels.
//! [`InlineTransport`] runs the same core on the caller's thread, one tick
//! per [`Transport::pump`], which keeps tests deterministic.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use mazeglow_common::TransportError;

use crate::protocol::{WorkerCommand, WorkerEvent};
use crate::worker::{WorkerCore, WorkerSettings, WorkerStatus};

/// Events that can wait in the worker's outbox.
const EVENT_CAPACITY: usize = 64;

/// The controller's side of the worker seam.
pub trait Transport: Send {
    /// Sends a command to the worker.
    fn send(&mut self, command: WorkerCommand) -> Result<(), TransportError>;

    /// Takes the next pending event, if any.
    fn try_recv(&mut self) -> Option<WorkerEvent>;

    /// Gives the worker a chance to run. Threaded workers run on their own
    /// and ignore this.
    fn pump(&mut self) {}

    /// Latest worker counters.
    fn status(&self) -> WorkerStatus;
}

/// Worker on a background thread.
pub struct ThreadedTransport {
    cmd_tx: Sender<WorkerCommand>,
    event_rx: Option<Receiver<WorkerEvent>>,
    status: Arc<RwLock<WorkerStatus>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadedTransport {
    /// Spawns the worker thread. Fails if the platform refuses to create a
    /// thread.
    pub fn spawn(settings: WorkerSettings, frame_interval: Duration) -> Result<Self, TransportError> {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<WorkerCommand>();
        let (event_tx, event_rx) = crossbeam_channel::bounded::<WorkerEvent>(EVENT_CAPACITY);
        let status = Arc::new(RwLock::new(WorkerStatus::default()));
        let shared = Arc::clone(&status);

        let handle = thread::Builder::new()
            .name("mazeglow-worker".to_string())
            .spawn(move || {
                worker_loop(WorkerCore::new(settings), &cmd_rx, &event_tx, &shared, frame_interval);
            })
            .map_err(|e| TransportError::SpawnFailed(e.to_string()))?;

        debug!("Worker thread started ({frame_interval:?} per frame)");
        Ok(Self {
            cmd_tx,
            event_rx: Some(event_rx),
            status,
            handle: Some(handle),
        })
    }
}

impl Transport for ThreadedTransport {
    fn send(&mut self, command: WorkerCommand) -> Result<(), TransportError> {
        self.cmd_tx.send(command).map_err(|_| TransportError::Disconnected)
    }

    fn try_recv(&mut self) -> Option<WorkerEvent> {
        let rx = self.event_rx.as_ref()?;
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("Worker thread has exited");
                self.event_rx = None;
                None
            },
        }
    }

    fn status(&self) -> WorkerStatus {
        *self.status.read()
    }
}

impl Drop for ThreadedTransport {
    fn drop(&mut self) {
        // Unblock a worker stuck on a full outbox before asking it to stop.
        if let Some(rx) = self.event_rx.take() {
            for event in rx.try_iter() {
                event.discard();
            }
        }
        let _ = self.cmd_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Worker thread panicked");
            }
        }
    }
}

/// Forwards an event to the controller. Returns `false` once nobody is
/// listening any more.
fn forward(core: &mut WorkerCore, event_tx: &Sender<WorkerEvent>, event: WorkerEvent) -> bool {
    match event {
        WorkerEvent::Render { .. } => match event_tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                trace!("Outbox full, dropping frame for {}", event.id());
                event.discard();
                core.frame_dropped();
                true
            },
            Err(TrySendError::Disconnected(event)) => {
                event.discard();
                false
            },
        },
        other => event_tx.send(other).is_ok(),
    }
}

fn worker_loop(
    mut core: WorkerCore,
    cmd_rx: &Receiver<WorkerCommand>,
    event_tx: &Sender<WorkerEvent>,
    status: &RwLock<WorkerStatus>,
    frame_interval: Duration,
) {
    let ticker = crossbeam_channel::tick(frame_interval);
    'outer: loop {
        let events = select! {
            recv(cmd_rx) -> msg => match msg {
                Ok(WorkerCommand::Shutdown) | Err(_) => None,
                Ok(command) => Some(core.handle(command)),
            },
            recv(ticker) -> _ => Some(core.tick()),
        };
        let Some(events) = events else {
            break;
        };
        for event in events {
            if !forward(&mut core, event_tx, event) {
                break 'outer;
            }
        }
        *status.write() = core.status();
    }
    core.handle(WorkerCommand::Shutdown);
    *status.write() = core.status();
    debug!("Worker thread stopped");
}

/// Worker on the caller's thread.
pub struct InlineTransport {
    core: WorkerCore,
    outbox: VecDeque<WorkerEvent>,
}

impl InlineTransport {
    /// Creates an inline worker.
    #[must_use]
    pub fn new(settings: WorkerSettings) -> Self {
        Self {
            core: WorkerCore::new(settings),
            outbox: VecDeque::new(),
        }
    }

    /// Number of undelivered events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }
}

impl Transport for InlineTransport {
    fn send(&mut self, command: WorkerCommand) -> Result<(), TransportError> {
        self.outbox.extend(self.core.handle(command));
        Ok(())
    }

    fn try_recv(&mut self) -> Option<WorkerEvent> {
        self.outbox.pop_front()
    }

    fn pump(&mut self) {
        self.outbox.extend(self.core.tick());
    }

    fn status(&self) -> WorkerStatus {
        self.core.status()
    }
}

impl Drop for InlineTransport {
    fn drop(&mut self) {
        for event in self.outbox.drain(..) {
            event.discard();
        }
    }
}
