//! Caret preservation across destructive re-renders.
//!
//! Before a mutation, a marker text node is inserted at the caret. After
//! the mutation the marker is searched for in the rebuilt text, isolated,
//! removed, and the caret is placed where it stood.

use tracing::{debug, warn};

use crate::perf::Stage;
use crate::surface::{NodeId, Surface};

const MARKER_OPEN: char = '\u{E000}';
const MARKER_CLOSE: char = '\u{E001}';

/// A marker string that does not occur in the text it was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSentinel {
    marker: String,
}

impl CursorSentinel {
    pub fn for_text(text: &str) -> Self {
        let base: String = [MARKER_OPEN, MARKER_CLOSE].iter().collect();
        if !text.contains(&base) {
            return Self { marker: base };
        }
        let marker = (0_u64..)
            .map(|nonce| format!("{MARKER_OPEN}{nonce}{MARKER_CLOSE}"))
            .find(|candidate| !text.contains(candidate.as_str()))
            .unwrap_or(base);
        Self { marker }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// `text` without the marker, and where the marker was.
    pub fn strip(&self, text: &str) -> (String, Option<usize>) {
        match text.find(&self.marker) {
            Some(at) => {
                let mut clean = String::with_capacity(text.len());
                clean.push_str(&text[..at]);
                clean.push_str(&text[at + self.marker.len()..]);
                (clean, Some(at))
            }
            None => (text.to_string(), None),
        }
    }
}

/// Where the caret ended up after a preserved mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretRestore {
    /// The marker survived; the caret is back at its logical offset.
    Restored(usize),
    /// The marker was lost; the caret sits at the start of the block that
    /// held it before the mutation.
    Fallback(usize),
}

impl CaretRestore {
    pub const fn offset(self) -> usize {
        match self {
            Self::Restored(offset) | Self::Fallback(offset) => offset,
        }
    }
}

/// Run `mutate` with the caret pinned by a marker.
///
/// `mutate` receives the surface with the marker in place and the sentinel
/// describing it. If the marker cannot be found afterwards the caret falls
/// back to the start of the top-level block that held it; this is reported
/// as [`CaretRestore::Fallback`], never as an error.
///
/// # Errors
///
/// Propagates the error from `mutate`. The marker is removed and the caret
/// put back before returning.
pub fn with_preserved_cursor<R, E>(
    surface: &mut Surface,
    mutate: impl FnOnce(&mut Surface, &CursorSentinel) -> Result<R, E>,
) -> Result<(R, CaretRestore), E> {
    let _scope = crate::perf::scope(Stage::CursorRestore);
    let caret = surface.caret_offset().unwrap_or(0);
    let fallback = block_start(surface, caret);
    let sentinel = CursorSentinel::for_text(&surface.tree().full_text());
    surface
        .tree_mut()
        .insert_text_at(caret, sentinel.marker(), false);

    let outcome = mutate(surface, &sentinel);
    let restore = match take_marker(surface, &sentinel) {
        Some(at) => {
            debug!(at, "caret restored from sentinel");
            CaretRestore::Restored(at)
        }
        None => {
            let at = fallback.min(surface.tree().full_text().len());
            warn!(caret, at, "cursor sentinel lost; caret moved to block start");
            crate::perf::log_event("cursor.sentinel_lost", format!("caret={caret} fallback={at}"));
            CaretRestore::Fallback(at)
        }
    };
    surface.set_caret(restore.offset());
    outcome.map(|value| (value, restore))
}

/// Find, isolate and remove the marker. Returns its offset.
fn take_marker(surface: &mut Surface, sentinel: &CursorSentinel) -> Option<usize> {
    let text = surface.tree().full_text();
    let at = text.find(sentinel.marker())?;
    let range = at..at + sentinel.marker().len();
    let tree = surface.tree_mut();
    match tree.isolate(range.clone()) {
        Some(node) => tree.remove(node),
        None => {
            // Marker split across text nodes.
            tree.splice(range, "");
        }
    }
    Some(at)
}

/// Offset where the top-level block containing `offset` starts.
fn block_start(surface: &Surface, offset: usize) -> usize {
    let tree = surface.tree();
    let Some(anchor) = tree.caret_anchor(offset) else {
        return 0;
    };
    let root = tree.root();
    let top: NodeId = std::iter::once(anchor.node)
        .chain(tree.ancestors(anchor.node))
        .find(|&n| tree.parent(n) == Some(root))
        .unwrap_or(anchor.node);
    tree.node_range(top).map_or(0, |r| r.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::markdown::parse;
    use crate::render::render_document;
    use crate::surface::DisplayTree;

    fn surface(text: &str) -> Surface {
        let mut tree = DisplayTree::new();
        render_document(&mut tree, &parse(text).unwrap());
        Surface::new(tree)
    }

    /// Reparse the whole text the way the editor does.
    fn reflow(surface: &mut Surface, sentinel: &CursorSentinel) -> Result<String, ParseError> {
        let (clean, at) = sentinel.strip(&surface.tree().full_text());
        let document = parse(&clean)?;
        render_document(surface.tree_mut(), &document);
        if let Some(at) = at {
            surface.tree_mut().insert_text_at(at, sentinel.marker(), false);
        }
        Ok(clean)
    }

    #[test]
    fn test_caret_survives_full_rerender() {
        let mut surface = surface("# Title\n\nsome **bold** text\n");
        surface.set_caret(17);
        let (text, restore) = with_preserved_cursor(&mut surface, reflow).unwrap();
        assert_eq!(text, "# Title\n\nsome **bold** text\n");
        assert_eq!(restore, CaretRestore::Restored(17));
        assert_eq!(surface.caret_offset(), Some(17));
        assert_eq!(surface.tree().full_text(), text);
    }

    #[test]
    fn test_lost_sentinel_falls_back_to_block_start() {
        let mut surface = surface("first\n\nsecond line\n");
        surface.set_caret(12);
        let (_, restore) = with_preserved_cursor(&mut surface, |surface, _| {
            render_document(surface.tree_mut(), &parse("first\n\nX\n").unwrap());
            Ok::<_, ParseError>(())
        })
        .unwrap();
        assert_eq!(restore, CaretRestore::Fallback(7));
        assert_eq!(surface.caret_offset(), Some(7));
        assert!(!surface.tree().full_text().contains(MARKER_OPEN));
    }

    #[test]
    fn test_failed_mutation_removes_marker_and_restores_caret() {
        let mut surface = surface("abc def");
        surface.set_caret(4);
        let err = with_preserved_cursor(&mut surface, |_, _| {
            Err::<(), _>(ParseError::NestingTooDeep {
                depth: 1,
                limit: 0,
                offset: 0,
            })
        })
        .unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }));
        assert_eq!(surface.tree().full_text(), "abc def");
        assert_eq!(surface.caret_offset(), Some(4));
    }

    #[test]
    fn test_marker_is_unique_for_text() {
        let base: String = [MARKER_OPEN, MARKER_CLOSE].iter().collect();
        let text = format!("a{base}b");
        let sentinel = CursorSentinel::for_text(&text);
        assert_ne!(sentinel.marker(), base);
        assert!(!text.contains(sentinel.marker()));
    }

    #[test]
    fn test_strip_reports_position() {
        let sentinel = CursorSentinel::for_text("");
        let text = format!("ab{}cd", sentinel.marker());
        assert_eq!(sentinel.strip(&text), ("abcd".to_string(), Some(2)));
        assert_eq!(sentinel.strip("abcd"), ("abcd".to_string(), None));
    }

    #[test]
    fn test_caret_at_line_start_inside_list() {
        let mut surface = surface("- one\n- two\n");
        surface.set_caret(6);
        let (_, restore) = with_preserved_cursor(&mut surface, reflow).unwrap();
        assert_eq!(restore, CaretRestore::Restored(6));
    }
}
