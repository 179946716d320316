//! Terminal host for the live editor.
//!
//! This module follows The Elm Architecture (TEA):
//! - [`Model`]: the complete application state, including the [`Editor`]
//! - [`Message`]: all possible events and actions
//! - [`update`]: state transitions
//! - [`App::run`]: main event loop, save side effects and rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{FOOTER_ROWS, Model, ToastLevel};
pub use update::{Message, update};

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::autosave::DEFAULT_AUTOSAVE_MS;
use crate::editor::Editor;
use crate::keymap::{Keymap, Platform};
use crate::vault::DocumentStore;

/// Main application struct: a document in a store, opened for editing.
pub struct App {
    document_path: String,
    store: Arc<dyn DocumentStore>,
    keymap: Keymap,
    autosave_ms: Option<u64>,
}

impl App {
    /// Edit `document_path` in `store`, with the platform's default key
    /// bindings and autosave on.
    pub fn new(document_path: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            document_path: document_path.into(),
            store,
            keymap: Keymap::defaults(Platform::current()),
            autosave_ms: Some(DEFAULT_AUTOSAVE_MS),
        }
    }

    #[must_use]
    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    /// Autosave delay in milliseconds, or `None` to save only on request.
    #[must_use]
    pub const fn with_autosave(mut self, delay_ms: Option<u64>) -> Self {
        self.autosave_ms = delay_ms;
        self
    }

    /// Load the document from the store and open it in an editor.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot produce the document or it does not
    /// parse.
    pub fn open_editor(&self) -> Result<Editor> {
        let text = self
            .store
            .load(&self.document_path)
            .with_context(|| format!("Failed to load {}", self.document_path))?;
        Editor::open(&text).with_context(|| format!("Failed to parse {}", self.document_path))
    }

    /// The initial model for an opened editor on a terminal of `size`.
    pub fn model_for(&self, editor: Editor, size: (u16, u16)) -> Model {
        Model::new(
            self.document_path.clone(),
            editor,
            self.store.location(),
            size,
        )
        .with_keymap(self.keymap.clone())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("document_path", &self.document_path)
            .field("store", &self.store.location())
            .field("autosave_ms", &self.autosave_ms)
            .finish_non_exhaustive()
    }
}
