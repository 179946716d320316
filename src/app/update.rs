use std::ops::Range;

use tracing::debug;

use crate::app::{Model, ToastLevel};
use crate::autosave::SaveStatus;
use crate::document::Direction;
use crate::editor::{Dispatch, InputEvent};

use super::model::FOOTER_ROWS;

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing
    InsertText(String),
    Newline,
    DeleteBackward,
    DeleteForward,

    // Caret and selection
    MoveCaret(Direction),
    MoveWord(Direction),
    LineStart,
    LineEnd,
    /// Put a collapsed caret at a document offset (mouse press)
    SetCaret(usize),
    /// Extend the selection from the drag anchor to an offset (mouse drag)
    SelectTo(usize),
    ClearSelection,

    // Scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    /// Terminal resized to (width, height)
    Resize(u16, u16),

    // Key-bound actions
    Save,
    Quit,
    ToggleSearchModal,
    CloseSearchModal,

    // Save worker reports
    SaveStarted(u64),
    SaveFinished {
        revision: u64,
        error: Option<String>,
    },
}

/// Apply a message to the model.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::InsertText(text) => edit(&mut model, InputEvent::insert_text(text)),
        Message::Newline => edit(&mut model, InputEvent::newline()),
        Message::DeleteBackward => edit(&mut model, InputEvent::delete_backward()),
        Message::DeleteForward => edit(&mut model, InputEvent::delete_forward()),

        Message::MoveCaret(direction) => {
            model.editor.move_caret(direction);
            model.relayout();
        }
        Message::MoveWord(direction) => {
            model.editor.move_word(direction);
            model.relayout();
        }
        Message::LineStart => {
            model.editor.move_home();
            model.relayout();
        }
        Message::LineEnd => {
            model.editor.move_end();
            model.relayout();
        }
        Message::SetCaret(offset) => {
            model.drag_anchor = Some(offset);
            model.editor.set_caret(offset);
            model.relayout();
        }
        Message::SelectTo(offset) => {
            let anchor = *model.drag_anchor.get_or_insert(offset);
            model.editor.select(ordered(anchor, offset));
            model.relayout();
        }
        Message::ClearSelection => {
            model.drag_anchor = None;
            model.editor.clear_selection();
            model.relayout();
        }

        Message::ScrollUp(n) => model.viewport.scroll_up(n),
        Message::ScrollDown(n) => model.viewport.scroll_down(n),
        Message::PageUp => model.viewport.page_up(),
        Message::PageDown => model.viewport.page_down(),
        Message::Resize(width, height) => {
            model
                .viewport
                .resize(width, height.saturating_sub(FOOTER_ROWS));
            model.relayout();
        }

        // The save itself is a side effect; the worker reports back.
        Message::Save => {}
        Message::Quit => {
            if model.is_dirty() && !model.quit_armed {
                model.quit_armed = true;
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes; quit again to discard them",
                );
            } else {
                model.should_quit = true;
            }
        }
        Message::ToggleSearchModal => {
            model.search_modal_visible = !model.search_modal_visible;
        }
        Message::CloseSearchModal => model.search_modal_visible = false,

        Message::SaveStarted(_) => model.save_status = SaveStatus::Saving,
        Message::SaveFinished {
            revision,
            error: None,
        } => {
            if revision == model.editor.document().revision() {
                model.editor.document_mut().mark_clean();
                model.save_status = SaveStatus::Saved { revision };
            } else {
                debug!(
                    revision,
                    current = model.editor.document().revision(),
                    "saved an older revision; still dirty"
                );
                model.save_status = SaveStatus::Pending;
            }
        }
        Message::SaveFinished {
            error: Some(error), ..
        } => {
            model.show_toast(ToastLevel::Error, format!("Save failed: {error}"));
            model.save_status = SaveStatus::Failed(error);
        }
    }
    model
}

/// Hand an input event to the editor and reflect the outcome.
fn edit(model: &mut Model, mut event: InputEvent) {
    model.quit_armed = false;
    match model.editor.handle_input(&mut event) {
        Dispatch::Applied(report) => {
            debug!(revision = report.revision, caret = ?report.caret, "edit applied");
            model.save_status = SaveStatus::Pending;
        }
        Dispatch::Rejected(err) => {
            model.show_toast(ToastLevel::Warning, format!("Edit not applied: {err}"));
        }
        Dispatch::Selected { .. } | Dispatch::Queued | Dispatch::Skipped => {}
    }
    model.relayout();
}

const fn ordered(a: usize, b: usize) -> Range<usize> {
    if a <= b { a..b } else { b..a }
}
