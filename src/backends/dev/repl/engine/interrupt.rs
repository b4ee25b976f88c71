//! Interrupt controller
//!
//! Every unit runs on its own freshly spawned worker thread while the engine
//! thread waits on two channels: events from the worker and the cancel
//! signal. Cancelling abandons the worker: the engine stops listening, the
//! worker's remaining output goes nowhere, and nothing it produced reaches
//! the session.
//!
//! Each run also gets a [`CancelToken`]. A backend that polls it stops the
//! abandoned worker early; one that ignores it runs on until user code
//! returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::backends::dev::repl::backend_trait::ReplError;

/// Stack size of worker threads; user code may recurse deeply
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Longest uninterrupted nap of [`CancelToken::sleep`]
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Cancellation flag of one unit, polled by the code it runs
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleep for `duration`, waking early once cancelled
    ///
    /// Returns `false` if the sleep was cut short.
    pub fn sleep(
        &self,
        duration: Duration,
    ) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

/// Message sent by a worker to the engine
#[derive(Debug)]
pub enum WorkerEvent {
    /// One display fragment, in order
    Fragment(String),
    /// The unit finished; no events follow
    Finished(Result<(), ReplError>),
}

/// Sending half handed to a worker job
pub type EventSender = Sender<WorkerEvent>;

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// All fragments, in the order they were produced
    Completed(Vec<String>),
    Failed(ReplError),
    Interrupted,
}

/// Handle for cancelling the unit in flight from another thread
#[derive(Debug, Clone)]
pub struct Interrupter {
    busy: Arc<AtomicBool>,
    cancel: Sender<()>,
    current: Arc<Mutex<CancelToken>>,
}

impl Interrupter {
    /// Cancel the running unit
    ///
    /// Returns `false` without doing anything when no unit is running.
    pub fn interrupt(&self) -> bool {
        if !self.busy.load(Ordering::SeqCst) {
            return false;
        }
        self.current.lock().cancel();
        // A full channel already holds a pending cancel
        let _ = self.cancel.try_send(());
        debug!("interrupt requested");
        true
    }

    /// Whether a unit is currently running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Runs units on worker threads and honours cancellation
#[derive(Debug)]
pub struct InterruptController {
    busy: Arc<AtomicBool>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
    /// Token of the unit in flight, replaced before each run
    current: Arc<Mutex<CancelToken>>,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    /// Create a controller with no unit in flight
    pub fn new() -> Self {
        let (cancel_tx, cancel_rx) = channel::bounded(1);
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            cancel_tx,
            cancel_rx,
            current: Arc::new(Mutex::new(CancelToken::new())),
        }
    }

    /// Handle for cancelling units from another thread
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            busy: Arc::clone(&self.busy),
            cancel: self.cancel_tx.clone(),
            current: Arc::clone(&self.current),
        }
    }

    /// Run `job` on a new worker thread named `name`, forwarding each
    /// fragment to `sink` as it arrives
    ///
    /// The job receives the run's cancel token. Blocks until the job
    /// finishes or an interrupt arrives.
    pub fn run<F>(
        &self,
        name: String,
        job: F,
        sink: &mut dyn FnMut(&str),
    ) -> RunOutcome
    where
        F: FnOnce(&EventSender, CancelToken) -> Result<(), ReplError> + Send + 'static,
    {
        // A cancel that arrived after the previous unit finished is stale
        while self.cancel_rx.try_recv().is_ok() {
            debug!("dropping stale interrupt");
        }

        let token = CancelToken::new();
        *self.current.lock() = token.clone();
        let cancelled = token.clone();

        let (events_tx, events_rx) = channel::unbounded();
        let spawned = thread::Builder::new()
            .name(name.clone())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let result = job(&events_tx, token);
                let _ = events_tx.send(WorkerEvent::Finished(result));
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                return RunOutcome::Failed(ReplError::Runtime(format!(
                    "failed to start evaluation worker: {}",
                    e
                )));
            }
        };

        self.busy.store(true, Ordering::SeqCst);
        let mut fragments = Vec::new();

        let outcome = loop {
            let event = crossbeam::select! {
                recv(events_rx) -> event => Some(event),
                recv(self.cancel_rx) -> _ => None,
            };
            match event {
                Some(Ok(WorkerEvent::Fragment(text))) => {
                    sink(&text);
                    fragments.push(text);
                }
                Some(Ok(WorkerEvent::Finished(Ok(())))) => {
                    break RunOutcome::Completed(std::mem::take(&mut fragments));
                }
                // A worker that honoured the token may report before the
                // cancel signal is seen
                Some(Ok(WorkerEvent::Finished(Err(_)))) if cancelled.is_cancelled() => {
                    break RunOutcome::Interrupted;
                }
                Some(Ok(WorkerEvent::Finished(Err(e)))) => break RunOutcome::Failed(e),
                Some(Err(_)) => {
                    break RunOutcome::Failed(ReplError::Runtime(
                        "evaluation worker panicked".to_string(),
                    ));
                }
                None => break RunOutcome::Interrupted,
            }
        };

        self.busy.store(false, Ordering::SeqCst);

        if matches!(outcome, RunOutcome::Interrupted) {
            warn!("abandoning worker {} after interrupt", name);
            // The worker may still be running, so it is never joined
            drop(events_rx);
        } else if handle.join().is_err() {
            debug!("worker {} ended by panic", name);
        }
        outcome
    }
}
