//! The live editing pipeline.
//!
//! An accepted input event runs the whole reflow before anything else is
//! looked at: the edit is applied to the surface text, the text is
//! re-parsed and re-rendered under a preserved caret, the active set is
//! recomputed and reconciled, and the raw document takes the same edit.
//! Events that arrive while a reflow is in flight are queued and run in
//! order once it finishes.

mod input;

pub use input::{EditorEvent, InputEvent, InputKind};

use std::collections::VecDeque;
use std::ops::Range;

use tracing::{debug, warn};

use crate::cursor::{CaretRestore, CursorSentinel, with_preserved_cursor};
use crate::document::{Direction, RawDocument};
use crate::error::{Busy, ParseError};
use crate::markdown::parse;
use crate::perf::Stage;
use crate::reconcile::reconcile;
use crate::render::render_document;
use crate::selection::{ActiveSet, active_nodes};
use crate::surface::{DisplayTree, Surface};

/// Whether the pipeline is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReflowState {
    #[default]
    Idle,
    Reflowing,
}

/// Non-reentrant guard around the pipeline.
#[derive(Debug, Default)]
pub struct ReflowGate {
    state: ReflowState,
}

impl ReflowGate {
    pub const fn state(&self) -> ReflowState {
        self.state
    }

    pub const fn is_reflowing(&self) -> bool {
        matches!(self.state, ReflowState::Reflowing)
    }

    /// Move to `Reflowing`.
    ///
    /// # Errors
    ///
    /// [`Busy`] if a reflow is already running.
    pub const fn enter(&mut self) -> Result<(), Busy> {
        match self.state {
            ReflowState::Reflowing => Err(Busy),
            ReflowState::Idle => {
                self.state = ReflowState::Reflowing;
                Ok(())
            }
        }
    }

    pub const fn leave(&mut self) {
        self.state = ReflowState::Idle;
    }
}

/// Outcome of an accepted edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflowReport {
    /// Raw document revision after the edit.
    pub revision: u64,
    pub caret: CaretRestore,
    /// Size of the active set after reconciliation.
    pub active: usize,
}

/// What the editor did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Applied(ReflowReport),
    /// A selection change was reconciled.
    Selected { active: usize },
    /// A reflow was in flight; the event runs after it.
    Queued,
    /// Nothing to do: the event was already handled, there was no
    /// selection, or the edit would not change the text.
    Skipped,
    /// The edited text could not be parsed; the previous render stands.
    Rejected(ParseError),
}

/// A document open for live editing.
#[derive(Debug, Default)]
pub struct Editor {
    surface: Surface,
    document: RawDocument,
    active: ActiveSet,
    gate: ReflowGate,
    queue: VecDeque<EditorEvent>,
    goal_col: Option<usize>,
}

impl Editor {
    /// Parse and render `text` into a new editor with no selection.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if `text` cannot be parsed.
    pub fn open(text: &str) -> Result<Self, ParseError> {
        let mut editor = Self::default();
        editor.load(text)?;
        Ok(editor)
    }

    /// Replace the whole document, e.g. after loading it from a store.
    /// The new document is clean.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if `text` cannot be parsed; the editor is
    /// left unchanged.
    pub fn load(&mut self, text: &str) -> Result<(), ParseError> {
        let document = parse(text)?;
        let mut tree = DisplayTree::new();
        render_document(&mut tree, &document);
        self.surface = Surface::new(tree);
        self.document = RawDocument::from_text(text);
        self.active = ActiveSet::empty();
        self.queue.clear();
        self.goal_col = None;
        debug!(len = text.len(), "document loaded");
        Ok(())
    }

    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    pub const fn document(&self) -> &RawDocument {
        &self.document
    }

    pub const fn document_mut(&mut self) -> &mut RawDocument {
        &mut self.document
    }

    pub const fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub const fn reflow_state(&self) -> ReflowState {
        self.gate.state()
    }

    /// Events waiting for the current reflow to finish.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn caret_offset(&self) -> Option<usize> {
        self.surface.caret_offset()
    }

    /// Handle a text-input notification from the host.
    ///
    /// The event's default handling is suppressed here. An event whose
    /// default was already suppressed (a key binding consumed it, or it
    /// was handed in twice) is skipped.
    pub fn handle_input(&mut self, event: &mut InputEvent) -> Dispatch {
        if !event.prevent_default() {
            debug!(kind = ?event.kind(), "input already handled; skipping");
            return Dispatch::Skipped;
        }
        self.dispatch(EditorEvent::Input(event.kind().clone()))
    }

    /// Run `event`, or queue it if a reflow is in flight. Queued events
    /// run in order as soon as the gate is idle again.
    pub fn dispatch(&mut self, event: EditorEvent) -> Dispatch {
        if self.gate.is_reflowing() {
            debug!(?event, "reflow in flight; event queued");
            self.queue.push_back(event);
            return Dispatch::Queued;
        }
        let outcome = self.process(event);
        self.drain_queue();
        outcome
    }

    /// Run queued events while the gate is idle.
    pub fn drain_queue(&mut self) -> Vec<Dispatch> {
        let mut outcomes = Vec::new();
        while !self.gate.is_reflowing() {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            outcomes.push(self.process(event));
        }
        outcomes
    }

    pub fn set_caret(&mut self, offset: usize) -> Dispatch {
        self.surface.set_caret(offset.min(self.document.len()));
        self.goal_col = None;
        self.notify_selection()
    }

    pub fn select(&mut self, range: Range<usize>) -> Dispatch {
        let len = self.document.len();
        self.surface.select(range.start.min(len)..range.end.min(len));
        self.goal_col = None;
        self.notify_selection()
    }

    pub fn clear_selection(&mut self) -> Dispatch {
        self.surface.set_selection(None);
        self.goal_col = None;
        self.notify_selection()
    }

    /// Move the caret one step, keeping the column across vertical moves.
    pub fn move_caret(&mut self, direction: Direction) -> Dispatch {
        let from = self.caret_offset().unwrap_or(0);
        let motion = self.document.motion(from, direction, self.goal_col);
        self.surface.set_caret(motion.offset);
        self.goal_col = matches!(direction, Direction::Up | Direction::Down)
            .then_some(motion.goal_col);
        self.notify_selection()
    }

    pub fn move_word(&mut self, direction: Direction) -> Dispatch {
        let from = self.caret_offset().unwrap_or(0);
        let to = match direction {
            Direction::Left | Direction::Up => self.document.word_left(from),
            Direction::Right | Direction::Down => self.document.word_right(from),
        };
        self.set_caret(to)
    }

    pub fn move_home(&mut self) -> Dispatch {
        let from = self.caret_offset().unwrap_or(0);
        self.set_caret(self.document.line_start(from))
    }

    pub fn move_end(&mut self) -> Dispatch {
        let from = self.caret_offset().unwrap_or(0);
        self.set_caret(self.document.line_end(from))
    }

    fn notify_selection(&mut self) -> Dispatch {
        if self.surface.take_selection_changed() {
            self.dispatch(EditorEvent::SelectionChanged)
        } else {
            Dispatch::Skipped
        }
    }

    fn process(&mut self, event: EditorEvent) -> Dispatch {
        match event {
            EditorEvent::Input(kind) => self.apply(&kind),
            EditorEvent::SelectionChanged => self.refresh_selection(),
        }
    }

    fn refresh_selection(&mut self) -> Dispatch {
        if self.gate.enter().is_err() {
            self.queue.push_back(EditorEvent::SelectionChanged);
            return Dispatch::Queued;
        }
        let next = active_nodes(&self.surface);
        self.active = reconcile(&mut self.surface, &self.active, &next);
        self.surface.take_selection_changed();
        self.gate.leave();
        Dispatch::Selected {
            active: self.active.len(),
        }
    }

    fn apply(&mut self, kind: &InputKind) -> Dispatch {
        let Some(selection) = self
            .surface
            .selection_offsets()
            .or_else(|| self.document.is_empty().then_some(0..0))
        else {
            debug!(?kind, "no selection; input ignored");
            return Dispatch::Skipped;
        };
        let Some((range, insert)) = self.edit_for(kind, selection) else {
            return Dispatch::Skipped;
        };
        if self.gate.enter().is_err() {
            self.queue.push_back(EditorEvent::Input(kind.clone()));
            return Dispatch::Queued;
        }

        let mut scope = crate::perf::scope(Stage::Reflow);
        scope.note(format!("edit={range:?} insert={}", insert.len()));
        let snapshot = self.surface.clone();
        let outcome = match reflow(&mut self.surface, range.clone(), &insert) {
            Ok(caret) => {
                self.document.replace(range, &insert);
                let next = active_nodes(&self.surface);
                self.active = reconcile(&mut self.surface, &self.active, &next);
                self.surface.take_selection_changed();
                self.goal_col = None;
                crate::perf::log_event(
                    "editor.applied",
                    format!("revision={} caret={:?}", self.document.revision(), caret),
                );
                Dispatch::Applied(ReflowReport {
                    revision: self.document.revision(),
                    caret,
                    active: self.active.len(),
                })
            }
            Err(err) => {
                warn!(%err, "edit rejected; previous render kept");
                crate::perf::log_event("editor.rejected", err.to_string());
                self.surface = snapshot;
                Dispatch::Rejected(err)
            }
        };
        self.gate.leave();
        outcome
    }

    /// The byte range to replace and the replacement for an input.
    fn edit_for(&self, kind: &InputKind, selection: Range<usize>) -> Option<(Range<usize>, String)> {
        let collapsed = selection.is_empty();
        match kind {
            InputKind::InsertText(text) if text.is_empty() && collapsed => None,
            InputKind::InsertText(text) => Some((selection, text.clone())),
            InputKind::InsertNewline => Some((selection, "\n".to_string())),
            InputKind::DeleteBackward | InputKind::DeleteForward if !collapsed => {
                Some((selection, String::new()))
            }
            InputKind::DeleteBackward if selection.start == 0 => None,
            InputKind::DeleteBackward => {
                let from = self.document.prev_char(selection.start);
                Some((from..selection.start, String::new()))
            }
            InputKind::DeleteForward if selection.end >= self.document.len() => None,
            InputKind::DeleteForward => {
                let to = self.document.next_char(selection.start);
                Some((selection.start..to, String::new()))
            }
        }
    }
}

/// Apply an edit to the surface and rebuild it from its text with the
/// caret preserved.
fn reflow(
    surface: &mut Surface,
    range: Range<usize>,
    insert: &str,
) -> Result<CaretRestore, ParseError> {
    surface.tree_mut().splice(range.clone(), insert);
    surface.set_caret(range.start + insert.len());
    let ((), caret) = with_preserved_cursor(surface, reparse)?;
    Ok(caret)
}

/// Re-parse the surface text without the sentinel, re-render it, and put
/// the sentinel back at the same offset.
fn reparse(surface: &mut Surface, sentinel: &CursorSentinel) -> Result<(), ParseError> {
    let (clean, at) = sentinel.strip(&surface.tree().full_text());
    let document = parse(&clean)?;
    render_document(surface.tree_mut(), &document);
    if let Some(at) = at {
        surface
            .tree_mut()
            .insert_text_at(at, sentinel.marker(), false);
    }
    Ok(())
}
