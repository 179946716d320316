//! The editable display surface: a [`DisplayTree`] plus the current
//! selection, expressed as two anchors into it.

mod tree;

use std::ops::Range;

pub use tree::{Affinity, Anchor, DisplayTree, Element, Layout, NodeData, NodeId, Tag, Text};

/// An ordered selection. A caret is a selection with `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Anchor,
    pub end: Anchor,
}

impl Selection {
    pub const fn caret(at: Anchor) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surface {
    tree: DisplayTree,
    selection: Option<Selection>,
    selection_changed: bool,
}

impl Surface {
    pub const fn new(tree: DisplayTree) -> Self {
        Self {
            tree,
            selection: None,
            selection_changed: false,
        }
    }

    pub const fn tree(&self) -> &DisplayTree {
        &self.tree
    }

    pub const fn tree_mut(&mut self) -> &mut DisplayTree {
        &mut self.tree
    }

    pub const fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Replace the selection and queue a selection-change notification.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        if self.selection != selection {
            self.selection_changed = true;
        }
        self.selection = selection;
    }

    /// Select a global byte range. The start attaches downstream and the
    /// end upstream so boundary text outside the range is not touched.
    pub fn select(&mut self, range: Range<usize>) {
        if range.is_empty() {
            self.set_caret(range.start);
            return;
        }
        let start = self.tree.resolve(range.start, Affinity::Downstream);
        let end = self.tree.resolve(range.end, Affinity::Upstream);
        let selection = start.zip(end).map(|(start, end)| Selection { start, end });
        self.set_selection(selection);
    }

    pub fn set_caret(&mut self, offset: usize) {
        let caret = self.tree.caret_anchor(offset).map(Selection::caret);
        self.set_selection(caret);
    }

    /// The selection as global byte offsets, if its anchors are still live.
    pub fn selection_offsets(&self) -> Option<Range<usize>> {
        let selection = self.selection?;
        let start = self.tree.anchor_offset(selection.start)?;
        let end = self.tree.anchor_offset(selection.end)?;
        Some(start.min(end)..start.max(end))
    }

    pub fn caret_offset(&self) -> Option<usize> {
        let selection = self.selection?;
        self.tree.anchor_offset(selection.end)
    }

    /// Take the pending selection-change notification, if any.
    pub fn take_selection_changed(&mut self) -> bool {
        std::mem::replace(&mut self.selection_changed, false)
    }

    /// Swap in a new tree. The selection is dropped; callers re-seat it.
    pub fn replace_tree(&mut self, tree: DisplayTree) -> DisplayTree {
        self.set_selection(None);
        std::mem::replace(&mut self.tree, tree)
    }

    /// Run a structural edit that keeps the text unchanged, re-seating the
    /// selection at the same logical offsets afterwards. No notification is
    /// queued.
    pub fn edit_tree<R>(&mut self, edit: impl FnOnce(&mut DisplayTree) -> R) -> R {
        let offsets = self.selection_offsets();
        let collapsed = self.selection.is_some_and(|s| s.is_collapsed());
        let result = edit(&mut self.tree);
        self.selection = offsets.and_then(|range| {
            if collapsed {
                self.tree.caret_anchor(range.end).map(Selection::caret)
            } else {
                let start = self.tree.resolve(range.start, Affinity::Downstream)?;
                let end = self.tree.resolve(range.end, Affinity::Upstream)?;
                Some(Selection { start, end })
            }
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_words() -> Surface {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let p = tree.create_element(Tag::Paragraph, Some("hello world".into()));
        let text = tree.create_text("hello world", false);
        tree.append_child(p, text);
        tree.append_child(root, p);
        Surface::new(tree)
    }

    #[test]
    fn test_set_caret_queues_one_notification() {
        let mut surface = two_words();
        surface.set_caret(3);
        assert!(surface.take_selection_changed());
        assert!(!surface.take_selection_changed());
        surface.set_caret(3);
        assert!(!surface.take_selection_changed());
        assert_eq!(surface.caret_offset(), Some(3));
    }

    #[test]
    fn test_select_range_reports_offsets() {
        let mut surface = two_words();
        surface.select(6..11);
        assert_eq!(surface.selection_offsets(), Some(6..11));
        assert!(!surface.selection().unwrap().is_collapsed());
    }

    #[test]
    fn test_edit_tree_reseats_selection_after_split() {
        let mut surface = two_words();
        surface.set_caret(8);
        surface.take_selection_changed();
        surface.edit_tree(|tree| {
            let text = tree.text_nodes(tree.root())[0];
            tree.split_text(text, 5);
        });
        assert_eq!(surface.caret_offset(), Some(8));
        assert!(!surface.take_selection_changed());
    }

    #[test]
    fn test_no_selection_means_no_offsets() {
        let surface = two_words();
        assert_eq!(surface.selection_offsets(), None);
        assert_eq!(surface.caret_offset(), None);
    }
}
