use std::time::{Duration, Instant};

use crate::autosave::SaveStatus;
use crate::editor::Editor;
use crate::keymap::Keymap;
use crate::ui::layout::DocumentLayout;
use crate::ui::viewport::Viewport;

/// Rows below the document: the status bar.
pub const FOOTER_ROWS: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
pub struct Model {
    pub editor: Editor,
    /// Vault-relative path of the open document.
    pub document_path: String,
    /// Where the document is stored, for the status bar.
    pub store_location: String,
    pub keymap: Keymap,
    pub viewport: Viewport,
    pub layout: DocumentLayout,
    pub save_status: SaveStatus,
    pub search_modal_visible: bool,
    pub should_quit: bool,
    /// Caret offset where a mouse drag started.
    pub drag_anchor: Option<usize>,
    /// A quit was refused because of unsaved changes; the next one goes
    /// through.
    pub(super) quit_armed: bool,
    toast: Option<Toast>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(String::new(), Editor::default(), String::new(), (80, 24))
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("document_path", &self.document_path)
            .field("store_location", &self.store_location)
            .field("viewport", &self.viewport)
            .field("rows", &self.layout.row_count())
            .field("save_status", &self.save_status)
            .field("search_modal_visible", &self.search_modal_visible)
            .field("should_quit", &self.should_quit)
            .field("quit_armed", &self.quit_armed)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model for an opened document. `size` is the full terminal
    /// size; the status bar is taken off the height.
    pub fn new(
        document_path: String,
        editor: Editor,
        store_location: String,
        size: (u16, u16),
    ) -> Self {
        let (width, height) = size;
        let mut model = Self {
            editor,
            document_path,
            store_location,
            keymap: Keymap::default(),
            viewport: Viewport::new(width, height.saturating_sub(FOOTER_ROWS), 0),
            layout: DocumentLayout::default(),
            save_status: SaveStatus::Idle,
            search_modal_visible: false,
            should_quit: false,
            drag_anchor: None,
            quit_armed: false,
            toast: None,
        };
        model.relayout();
        model
    }

    #[must_use]
    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.document().is_dirty()
    }

    /// Rebuild the row layout from the display tree and keep the caret on
    /// screen.
    pub fn relayout(&mut self) {
        self.layout = DocumentLayout::build(self.editor.surface().tree());
        self.viewport.set_total_lines(self.layout.row_count());
        if let Some((row, _)) = self.caret_position() {
            self.viewport.reveal(row);
        }
    }

    /// Caret row and column in document coordinates.
    pub fn caret_position(&self) -> Option<(usize, usize)> {
        self.editor
            .caret_offset()
            .map(|offset| self.layout.caret_position(offset))
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
