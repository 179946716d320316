use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::debug;

use crate::app::{App, Message, Model};
use crate::document::Direction;
use crate::keymap::{QUIT, SAVE_DOCUMENT, TOGGLE_SEARCH_MODAL};
use crate::ui::DOCUMENT_LEFT_PADDING;

use super::event_loop::ResizeDebouncer;

/// Spaces inserted for Tab.
const TAB: &str = "    ";

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) => Some(Message::InsertText(text.replace("\r\n", "\n"))),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    /// Bound chords are consumed here and never reach the editor.
    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if let Some(action) = model.keymap.action_for_key(&key) {
            return match action {
                SAVE_DOCUMENT => Some(Message::Save),
                QUIT => Some(Message::Quit),
                TOGGLE_SEARCH_MODAL => Some(Message::ToggleSearchModal),
                other => {
                    debug!(action = other, "no handler for bound action");
                    None
                }
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('c') if ctrl => Some(Message::Quit),
            KeyCode::Char(c) if !ctrl && !alt => Some(Message::InsertText(c.to_string())),
            KeyCode::Enter => Some(Message::Newline),
            KeyCode::Tab => Some(Message::InsertText(TAB.to_string())),
            KeyCode::Backspace => Some(Message::DeleteBackward),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::Left if ctrl || alt => Some(Message::MoveWord(Direction::Left)),
            KeyCode::Right if ctrl || alt => Some(Message::MoveWord(Direction::Right)),
            KeyCode::Left => Some(Message::MoveCaret(Direction::Left)),
            KeyCode::Right => Some(Message::MoveCaret(Direction::Right)),
            KeyCode::Up => Some(Message::MoveCaret(Direction::Up)),
            KeyCode::Down => Some(Message::MoveCaret(Direction::Down)),
            KeyCode::Home => Some(Message::LineStart),
            KeyCode::End => Some(Message::LineEnd),
            KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Esc if model.search_modal_visible => Some(Message::CloseSearchModal),
            KeyCode::Esc => Some(Message::ClearSelection),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::ScrollUp => Some(Message::ScrollUp(3)),
            MouseEventKind::ScrollDown => Some(Message::ScrollDown(3)),
            MouseEventKind::Down(MouseButton::Left) => {
                offset_at_cell(model, mouse.column, mouse.row).map(Message::SetCaret)
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let row = mouse.row.min(model.viewport.height().saturating_sub(1));
                offset_at_cell(model, mouse.column, row).map(Message::SelectTo)
            }
            _ => None,
        }
    }
}

/// Document offset under a screen cell, if the cell is in the document area.
fn offset_at_cell(model: &Model, column: u16, row: u16) -> Option<usize> {
    if row >= model.viewport.height() {
        return None;
    }
    let doc_row = model.viewport.offset() + usize::from(row);
    let doc_col = usize::from(column.saturating_sub(DOCUMENT_LEFT_PADDING));
    Some(model.layout.offset_at(doc_row, doc_col))
}
