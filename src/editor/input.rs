//! Input notifications delivered to the editor by its host.

/// The text mutation an input event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    InsertText(String),
    InsertNewline,
    DeleteBackward,
    DeleteForward,
}

/// A text-input notification.
///
/// The host's default mutation for the event must not run: the editor
/// produces the resulting text itself. [`InputEvent::prevent_default`]
/// reports whether this call was the one that suppressed it, so a handler
/// can tell an event somebody else already consumed from a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    kind: InputKind,
    default_prevented: bool,
}

impl InputEvent {
    pub const fn new(kind: InputKind) -> Self {
        Self {
            kind,
            default_prevented: false,
        }
    }

    pub fn insert_text(text: impl Into<String>) -> Self {
        Self::new(InputKind::InsertText(text.into()))
    }

    pub const fn newline() -> Self {
        Self::new(InputKind::InsertNewline)
    }

    pub const fn delete_backward() -> Self {
        Self::new(InputKind::DeleteBackward)
    }

    pub const fn delete_forward() -> Self {
        Self::new(InputKind::DeleteForward)
    }

    pub const fn kind(&self) -> &InputKind {
        &self.kind
    }

    pub const fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Suppress the host's default handling. Returns `false` when it was
    /// already suppressed.
    pub const fn prevent_default(&mut self) -> bool {
        let first = !self.default_prevented;
        self.default_prevented = true;
        first
    }
}

/// Work the editor accepts from its host, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Input(InputKind),
    SelectionChanged,
}
