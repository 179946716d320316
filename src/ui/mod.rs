//! Terminal UI.
//!
//! - [`layout`]: display tree to rows, with markup hidden or shown
//! - [`viewport`]: which rows are on screen
//! - drawing of the document, caret and status bar

pub mod layout;
pub mod viewport;

mod render;
mod status;

pub use render::render;

/// Blank columns left of the document text.
pub const DOCUMENT_LEFT_PADDING: u16 = 2;
