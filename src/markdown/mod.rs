//! Markdown tokenization.
//!
//! Turns raw text into a [`Token`] tree in which every token keeps the exact
//! source slice it was parsed from. The renderer relies on that to rebuild
//! the text byte for byte.

mod parser;
mod token;

pub use parser::{MAX_NESTING, parse, parse_inline};
pub use token::{Token, TokenKind};
