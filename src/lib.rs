// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorEvent)
    clippy::module_name_repetitions
)]

//! # Synapse
//!
//! A terminal markdown editor that renders as you type.
//!
//! Every markdown element is shown rendered until the caret or selection
//! touches it; then that element alone switches to its raw source so it
//! can be edited. The text on screen always spells out the document byte
//! for byte, so edits map straight back to the source.
//!
//! ## Architecture
//!
//! The editing core is a reflow pipeline:
//! tokenize ([`markdown`]) → render ([`render`]) into a display tree
//! ([`surface`]) → track which elements the selection touches
//! ([`selection`]) → switch them between forms ([`reconcile`]), with the
//! caret carried across re-renders by a sentinel ([`cursor`]).
//! [`editor`] drives the pipeline for each input event and keeps the raw
//! document ([`document`]) in step.
//!
//! The terminal front end uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`ui`]: Terminal UI components
//! - [`keymap`]: Key chords and configurable bindings
//! - [`vault`]: Loading and saving documents
//! - [`autosave`]: Debounced background saves
//! - [`config`]: Persistent default flags

pub mod app;
pub mod autosave;
pub mod config;
pub mod cursor;
pub mod document;
pub mod editor;
pub mod error;
pub mod keymap;
pub mod markdown;
pub mod perf;
pub mod reconcile;
pub mod render;
pub mod selection;
pub mod surface;
pub mod ui;
pub mod vault;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::document::RawDocument;
    pub use crate::editor::Editor;
    pub use crate::ui::viewport::Viewport;
}
