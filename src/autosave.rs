//! Debounced saving.
//!
//! Edits reschedule a [`SaveDebouncer`]; once the document has been quiet
//! for the delay, its text is handed to a [`SaveWorker`] thread. Results
//! are polled by the event loop and never touch the document itself, so a
//! failed save only leaves the document dirty.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::perf::Stage;
use crate::vault::DocumentStore;

pub const DEFAULT_AUTOSAVE_MS: u64 = 1000;

/// Fixed-delay debounce keyed by document revision. Queuing again
/// replaces the pending save and restarts the delay.
#[derive(Debug)]
pub struct SaveDebouncer {
    delay_ms: u64,
    pending: Option<(u64, u64)>,
}

impl SaveDebouncer {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub const fn queue(&mut self, revision: u64, now_ms: u64) {
        self.pending = Some((revision, now_ms));
    }

    /// The revision to save, once the delay has passed since it was queued.
    pub fn take_ready(&mut self, now_ms: u64) -> Option<u64> {
        let (revision, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some(revision)
        } else {
            None
        }
    }

    pub const fn cancel(&mut self) {
        self.pending = None;
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Save state shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Pending,
    Saving,
    Saved { revision: u64 },
    Failed(String),
}

impl SaveStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Pending => "unsaved".to_string(),
            Self::Saving => "saving...".to_string(),
            Self::Saved { .. } => "saved".to_string(),
            Self::Failed(message) => format!("save failed: {message}"),
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug)]
struct SaveRequest {
    path: String,
    content: String,
    revision: u64,
}

/// Result of one save attempt.
#[derive(Debug)]
pub struct SaveOutcome {
    pub path: String,
    pub revision: u64,
    pub result: Result<(), StoreError>,
}

/// Background thread that writes documents to a store, in request order.
pub struct SaveWorker {
    requests: Option<Sender<SaveRequest>>,
    outcomes: Receiver<SaveOutcome>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl SaveWorker {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Fails if the thread cannot be spawned.
    pub fn spawn(store: Arc<dyn DocumentStore>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<SaveRequest>();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("synapse-save".to_string())
            .spawn(move || run_worker(store.as_ref(), &request_rx, &outcome_tx))?;
        Ok(Self {
            requests: Some(request_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
            in_flight: 0,
        })
    }

    /// Queue a save. Returns `false` if the worker has stopped.
    pub fn submit(&mut self, path: &str, content: String, revision: u64) -> bool {
        let Some(requests) = self.requests.as_ref() else {
            return false;
        };
        let request = SaveRequest {
            path: path.to_string(),
            content,
            revision,
        };
        if requests.send(request).is_err() {
            warn!(path, "save worker stopped; save dropped");
            return false;
        }
        self.in_flight += 1;
        true
    }

    /// A finished save, if one is ready.
    pub fn try_recv(&mut self) -> Option<SaveOutcome> {
        let outcome = self.outcomes.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Wait up to `timeout` for a finished save.
    pub fn wait(&mut self, timeout: Duration) -> Option<SaveOutcome> {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Saves submitted but not yet reported.
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        self.requests = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for SaveWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveWorker")
            .field("in_flight", &self.in_flight)
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

fn run_worker(
    store: &dyn DocumentStore,
    requests: &Receiver<SaveRequest>,
    outcomes: &Sender<SaveOutcome>,
) {
    for request in requests {
        let _scope = crate::perf::scope(Stage::Save);
        let result = store.save(&request.path, &request.content);
        match &result {
            Ok(()) => debug!(path = %request.path, revision = request.revision, "saved"),
            Err(err) => warn!(path = %request.path, %err, "save failed"),
        }
        crate::perf::log_event(
            "autosave.result",
            format!(
                "path={} revision={} ok={}",
                request.path,
                request.revision,
                result.is_ok()
            ),
        );
        let outcome = SaveOutcome {
            path: request.path,
            revision: request.revision,
            result,
        };
        if outcomes.send(outcome).is_err() {
            return;
        }
    }
}
