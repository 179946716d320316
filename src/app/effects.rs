use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::app::{App, Message, Model, update};
use crate::autosave::{SaveDebouncer, SaveOutcome, SaveWorker};
use crate::vault::DocumentStore;

/// How long quitting waits for saves still in flight.
const EXIT_SAVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Save side effects: explicit saves, the autosave debounce, and worker
/// results fed back into the model as messages.
pub(super) struct Saver {
    worker: SaveWorker,
    /// `None` when autosave is off.
    debouncer: Option<SaveDebouncer>,
    seen_revision: u64,
}

impl Saver {
    pub(super) fn spawn(store: Arc<dyn DocumentStore>, autosave_ms: Option<u64>) -> Result<Self> {
        let worker = SaveWorker::spawn(store).context("Failed to start the save worker")?;
        Ok(Self {
            worker,
            debouncer: autosave_ms.map(SaveDebouncer::new),
            seen_revision: 0,
        })
    }

    pub(super) fn is_pending(&self) -> bool {
        self.worker.in_flight() > 0
            || self
                .debouncer
                .as_ref()
                .is_some_and(SaveDebouncer::is_pending)
    }

    /// Reschedule the autosave when the document moved to a new revision.
    pub(super) fn observe(&mut self, model: &Model, now_ms: u64) {
        let revision = model.editor.document().revision();
        if revision == self.seen_revision {
            return;
        }
        self.seen_revision = revision;
        if let Some(debouncer) = self.debouncer.as_mut() {
            debouncer.queue(revision, now_ms);
        }
    }

    /// Hand the current text to the worker.
    pub(super) fn submit(&mut self, model: &mut Model) {
        if let Some(debouncer) = self.debouncer.as_mut() {
            debouncer.cancel();
        }
        let revision = model.editor.document().revision();
        let text = model.editor.text();
        if self.worker.submit(&model.document_path, text, revision) {
            *model = update(std::mem::take(model), Message::SaveStarted(revision));
        } else {
            *model = update(
                std::mem::take(model),
                Message::SaveFinished {
                    revision,
                    error: Some("save worker stopped".to_string()),
                },
            );
        }
    }

    /// Start a due autosave and apply finished saves. Returns whether the
    /// model changed.
    pub(super) fn tick(&mut self, model: &mut Model, now_ms: u64) -> bool {
        let mut changed = false;
        if let Some(revision) = self.debouncer.as_mut().and_then(|d| d.take_ready(now_ms))
            && model.is_dirty()
        {
            debug!(revision, "autosave due");
            self.submit(model);
            changed = true;
        }
        while let Some(outcome) = self.worker.try_recv() {
            apply_outcome(model, outcome);
            changed = true;
        }
        changed
    }

    /// Wait for saves still in flight before the terminal is released.
    pub(super) fn finish(&mut self, model: &mut Model) {
        while self.worker.in_flight() > 0 {
            let Some(outcome) = self.worker.wait(EXIT_SAVE_TIMEOUT) else {
                warn!(in_flight = self.worker.in_flight(), "gave up waiting for saves");
                return;
            };
            apply_outcome(model, outcome);
        }
    }
}

fn apply_outcome(model: &mut Model, outcome: SaveOutcome) {
    let SaveOutcome {
        revision, result, ..
    } = outcome;
    let error = result.err().map(|err| err.to_string());
    *model = update(
        std::mem::take(model),
        Message::SaveFinished { revision, error },
    );
}

impl App {
    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        saver: &mut Saver,
        msg: &Message,
        now_ms: u64,
    ) {
        match msg {
            Message::Save => saver.submit(model),
            _ => saver.observe(model, now_ms),
        }
    }
}
