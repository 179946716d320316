//! Arena-backed display tree.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`] index.
//! Removed nodes leave a tombstone so stale ids fail lookups instead of
//! aliasing new nodes. Every tree generation gets a fresh epoch.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// Index of a node in a [`DisplayTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// How a node takes part in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Block,
    Inline,
}

/// Display tag of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Root,
    Paragraph,
    Heading(u8),
    List { ordered: bool, start: usize },
    ListItem { task: bool, checked: bool },
    BlockQuote,
    CodeBlock { lang: Option<String> },
    Table,
    TableRow { header: bool },
    TableCell,
    Rule,
    Html { block: bool },
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String },
    Image { url: String },
    CodeSpan,
    LineBreak,
}

impl Tag {
    pub const fn layout(&self) -> Layout {
        match self {
            Self::Root
            | Self::Paragraph
            | Self::Heading(_)
            | Self::List { .. }
            | Self::ListItem { .. }
            | Self::BlockQuote
            | Self::CodeBlock { .. }
            | Self::Table
            | Self::TableRow { .. }
            | Self::TableCell
            | Self::Rule
            | Self::Html { block: true } => Layout::Block,
            Self::Html { block: false }
            | Self::Emphasis
            | Self::Strong
            | Self::Strikethrough
            | Self::Link { .. }
            | Self::Image { .. }
            | Self::CodeSpan
            | Self::LineBreak => Layout::Inline,
        }
    }

    /// Tags with the same variant describe the same kind of structure,
    /// whatever their attributes.
    pub fn same_variant(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    /// Raw markdown this element was rendered from. `None` for the root.
    pub markdown: Option<String>,
    /// Set while the element is a member of the active set.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
    /// Markdown syntax rather than payload: hidden in rendered form.
    pub markup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(Text),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Which neighbour a boundary offset attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// The text node ending at the offset.
    Upstream,
    /// The text node starting at the offset.
    Downstream,
}

/// A position inside the tree: a text node and a byte offset into it, or
/// an element and a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub node: NodeId,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    epoch: u64,
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTree {
    /// Create a tree holding only an empty root.
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element(Element {
                tag: Tag::Root,
                markdown: None,
                active: false,
            }),
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
            epoch: next_epoch(),
        }
    }

    /// Drop every node and start a new generation.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Generation counter. Ids from another epoch must not be used.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id)? {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&Text> {
        match self.data(id)? {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Nearest element carrying a markdown annotation, starting at `id`.
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.element(n).is_some_and(|e| e.markdown.is_some()))
    }

    /// Whether a markup text node is currently shown: its owner or any
    /// enclosing element is active.
    pub fn markup_visible(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .any(|n| self.element(n).is_some_and(|e| e.active))
    }

    pub fn lca(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        let chain: Vec<NodeId> = std::iter::once(a).chain(self.ancestors(a)).collect();
        std::iter::once(b)
            .chain(self.ancestors(b))
            .find(|n| chain.contains(n))
    }

    pub fn create_element(&mut self, tag: Tag, markdown: Option<String>) -> NodeId {
        self.push(NodeData::Element(Element {
            tag,
            markdown,
            active: false,
        }))
    }

    pub fn create_text(&mut self, content: impl Into<String>, markup: bool) -> NodeId {
        self.push(NodeData::Text(Text {
            content: content.into(),
            markup,
        }))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            parent: None,
            children: Vec::new(),
            data,
        }));
        id
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, usize::MAX, child);
    }

    fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let Some(node) = self.node_mut(parent) else {
            return;
        };
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        if let Some(child) = self.node_mut(child) {
            child.parent = Some(parent);
        }
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Detach `id` from its parent and tombstone its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        if let Some((parent, index)) = self.index_in_parent(id)
            && let Some(node) = self.node_mut(parent)
        {
            node.children.remove(index);
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(n.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
    }

    /// Put detached `replacements` where `old` is, then remove `old`.
    ///
    /// Returns `false` (and changes nothing) when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, replacements: &[NodeId]) -> bool {
        let Some((parent, index)) = self.index_in_parent(old) else {
            return false;
        };
        for (i, &new) in replacements.iter().enumerate() {
            self.insert_child(parent, index + i, new);
        }
        self.remove(old);
        true
    }

    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) {
        if let Some(Node {
            data: NodeData::Text(text),
            ..
        }) = self.node_mut(id)
        {
            text.content = content.into();
        }
    }

    /// Split a text node at byte `at`, keeping the head in `id`.
    ///
    /// Returns the new node holding the tail, or `None` when `at` is not a
    /// char boundary strictly inside the text.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        if at == 0 || at >= text.content.len() || !text.content.is_char_boundary(at) {
            return None;
        }
        let tail = text.content[at..].to_string();
        let markup = text.markup;
        let (parent, index) = self.index_in_parent(id)?;
        if let Some(NodeData::Text(text)) = self.node_mut(id).map(|n| &mut n.data) {
            text.content.truncate(at);
        }
        let new = self.create_text(tail, markup);
        self.insert_child(parent, index + 1, new);
        Some(new)
    }

    /// Pre-order listing of the subtree at `id`.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if !self.contains(n) {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Parent-before-children listing that visits siblings last to first.
    pub fn reverse_preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if !self.contains(n) {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter());
        }
        out
    }

    /// Text nodes under `id` in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.preorder(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// Concatenated text of the subtree at `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .map(|t| t.content.as_str())
            .collect()
    }

    /// The whole document text.
    pub fn full_text(&self) -> String {
        self.text_content(self.root)
    }

    /// Outermost annotations joined in document order, with unannotated
    /// text in between.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.root];
        while let Some(n) = stack.pop() {
            match self.data(n) {
                Some(NodeData::Text(text)) => out.push_str(&text.content),
                Some(NodeData::Element(Element {
                    markdown: Some(markdown),
                    ..
                })) => out.push_str(markdown),
                Some(NodeData::Element(_)) => stack.extend(self.children(n).iter().rev()),
                None => {}
            }
        }
        out
    }

    /// Global byte range of every text node, in document order.
    pub fn text_spans(&self) -> Vec<(NodeId, Range<usize>)> {
        let mut offset = 0;
        self.text_nodes(self.root)
            .into_iter()
            .filter_map(|n| {
                let len = self.text(n)?.content.len();
                let span = offset..offset + len;
                offset += len;
                Some((n, span))
            })
            .collect()
    }

    /// Global byte range covered by the subtree at `id`.
    pub fn node_range(&self, id: NodeId) -> Option<Range<usize>> {
        let mut offset = 0;
        self.find_range(self.root, id, &mut offset)
    }

    fn find_range(&self, at: NodeId, target: NodeId, offset: &mut usize) -> Option<Range<usize>> {
        let start = *offset;
        match self.data(at)? {
            NodeData::Text(text) => *offset += text.content.len(),
            NodeData::Element(_) => {
                for &child in self.children(at) {
                    if let Some(range) = self.find_range(child, target, offset) {
                        return Some(range);
                    }
                }
            }
        }
        (at == target).then(|| start..*offset)
    }

    /// Global offset of an anchor.
    pub fn anchor_offset(&self, anchor: Anchor) -> Option<usize> {
        let range = self.node_range(anchor.node)?;
        match self.data(anchor.node)? {
            NodeData::Text(text) => Some(range.start + anchor.offset.min(text.content.len())),
            NodeData::Element(_) => {
                let children = self.children(anchor.node);
                match children.get(anchor.offset) {
                    Some(&child) => Some(self.node_range(child)?.start),
                    None => Some(range.end),
                }
            }
        }
    }

    /// Anchor for a global offset with an explicit affinity, falling back
    /// to the other side when no text node exists on the preferred one.
    pub fn resolve(&self, offset: usize, affinity: Affinity) -> Option<Anchor> {
        let spans: Vec<(NodeId, Range<usize>)> = self
            .text_spans()
            .into_iter()
            .filter(|(_, span)| !span.is_empty())
            .collect();
        let upstream = spans
            .iter()
            .find(|(_, span)| span.start < offset && offset <= span.end);
        let downstream = spans
            .iter()
            .find(|(_, span)| span.start <= offset && offset < span.end);
        let (first, second) = match affinity {
            Affinity::Upstream => (upstream, downstream),
            Affinity::Downstream => (downstream, upstream),
        };
        if let Some((node, span)) = first.or(second) {
            return Some(Anchor {
                node: *node,
                offset: offset - span.start,
            });
        }
        // Past the end: clamp onto the last text node.
        spans.last().map(|(node, span)| Anchor {
            node: *node,
            offset: span.len(),
        })
    }

    /// Anchor for a collapsed caret at `offset`.
    ///
    /// The caret sticks to the character before it, except at the start of
    /// a line where it moves to the text that follows.
    pub fn caret_anchor(&self, offset: usize) -> Option<Anchor> {
        let upstream = self.resolve(offset, Affinity::Upstream)?;
        let after_newline = self
            .text(upstream.node)
            .is_some_and(|t| t.content.get(..upstream.offset).is_some_and(|s| s.ends_with('\n')));
        if offset == 0 || after_newline {
            return self.resolve(offset, Affinity::Downstream);
        }
        Some(upstream)
    }

    /// Replace the text in `range` with `insert`, editing text nodes in
    /// place. Returns the node that received the insertion.
    pub fn splice(&mut self, range: Range<usize>, insert: &str) -> Option<NodeId> {
        for (node, span) in self.text_spans().into_iter().rev() {
            if span.end <= range.start || span.start >= range.end {
                continue;
            }
            let Some(text) = self.text(node) else {
                continue;
            };
            let from = range.start.max(span.start) - span.start;
            let to = range.end.min(span.end) - span.start;
            if !text.content.is_char_boundary(from) || !text.content.is_char_boundary(to) {
                continue;
            }
            let mut content = text.content.clone();
            content.replace_range(from..to, "");
            self.set_text(node, content);
        }
        if insert.is_empty() {
            return None;
        }
        match self.caret_anchor(range.start) {
            Some(anchor) => {
                let mut content = self.text(anchor.node)?.content.clone();
                if !content.is_char_boundary(anchor.offset) {
                    return None;
                }
                content.insert_str(anchor.offset, insert);
                self.set_text(anchor.node, content);
                Some(anchor.node)
            }
            None => {
                let node = self.create_text(insert, false);
                self.append_child(self.root, node);
                Some(node)
            }
        }
    }

    /// Insert `content` as its own text node at a global offset, splitting
    /// the text node there if needed.
    pub fn insert_text_at(&mut self, offset: usize, content: &str, markup: bool) -> NodeId {
        let new = self.create_text(content, markup);
        let Some(anchor) = self.caret_anchor(offset) else {
            self.append_child(self.root, new);
            return new;
        };
        let len = self.text(anchor.node).map_or(0, |t| t.content.len());
        let (parent, index) = match self.index_in_parent(anchor.node) {
            Some(found) => found,
            None => (self.root, usize::MAX),
        };
        if anchor.offset == 0 {
            self.insert_child(parent, index, new);
        } else if anchor.offset >= len {
            self.insert_child(parent, index + 1, new);
        } else {
            self.split_text(anchor.node, anchor.offset);
            self.insert_child(parent, index + 1, new);
        }
        new
    }

    /// Make the text in `range` a text node of its own and return it.
    pub fn isolate(&mut self, range: Range<usize>) -> Option<NodeId> {
        let spans = self.text_spans();
        let (node, span) = spans
            .iter()
            .find(|(_, span)| span.start <= range.start && range.end <= span.end && !span.is_empty())
            .cloned()?;
        let mut target = node;
        let head = range.start - span.start;
        if head > 0 {
            target = self.split_text(node, head)?;
        }
        let len = range.end - range.start;
        if self.text(target).is_some_and(|t| t.content.len() > len) {
            self.split_text(target, len)?;
        }
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root -> p("ab" "cd") strong("**" "x" "**")
    fn sample() -> (DisplayTree, NodeId, NodeId, Vec<NodeId>) {
        let mut tree = DisplayTree::new();
        let p = tree.create_element(Tag::Paragraph, Some("abcd".into()));
        let ab = tree.create_text("ab", false);
        let cd = tree.create_text("cd", false);
        tree.append_child(p, ab);
        tree.append_child(p, cd);
        let strong = tree.create_element(Tag::Strong, Some("**x**".into()));
        let open = tree.create_text("**", true);
        let x = tree.create_text("x", false);
        let close = tree.create_text("**", true);
        for n in [open, x, close] {
            tree.append_child(strong, n);
        }
        tree.append_child(p, strong);
        let root = tree.root();
        tree.append_child(root, p);
        (tree, p, strong, vec![ab, cd, open, x, close])
    }

    #[test]
    fn test_text_and_ranges() {
        let (tree, p, strong, leaves) = sample();
        assert_eq!(tree.full_text(), "abcd**x**");
        assert_eq!(tree.node_range(p), Some(0..9));
        assert_eq!(tree.node_range(strong), Some(4..9));
        assert_eq!(tree.node_range(leaves[3]), Some(6..7));
    }

    #[test]
    fn test_traversal_orders() {
        let (tree, p, strong, leaves) = sample();
        assert_eq!(
            tree.preorder(p),
            vec![p, leaves[0], leaves[1], strong, leaves[2], leaves[3], leaves[4]]
        );
        assert_eq!(
            tree.reverse_preorder(p),
            vec![p, strong, leaves[4], leaves[3], leaves[2], leaves[1], leaves[0]]
        );
    }

    #[test]
    fn test_lca_and_owner() {
        let (tree, p, strong, leaves) = sample();
        assert_eq!(tree.lca(leaves[0], leaves[3]), Some(p));
        assert_eq!(tree.lca(leaves[2], leaves[4]), Some(strong));
        assert_eq!(tree.owner(leaves[3]), Some(strong));
        assert_eq!(tree.owner(leaves[0]), Some(p));
        assert_eq!(tree.owner(tree.root()), None);
    }

    #[test]
    fn test_caret_prefers_text_before_offset() {
        let (tree, _, _, leaves) = sample();
        let anchor = tree.caret_anchor(2).unwrap();
        assert_eq!(anchor, Anchor { node: leaves[0], offset: 2 });
        let start = tree.caret_anchor(0).unwrap();
        assert_eq!(start, Anchor { node: leaves[0], offset: 0 });
        assert_eq!(tree.resolve(2, Affinity::Downstream).unwrap().node, leaves[1]);
    }

    #[test]
    fn test_caret_after_newline_moves_downstream() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let a = tree.create_text("a\n", false);
        let b = tree.create_text("b", false);
        tree.append_child(root, a);
        tree.append_child(root, b);
        assert_eq!(tree.caret_anchor(2), Some(Anchor { node: b, offset: 0 }));
    }

    #[test]
    fn test_anchor_offset_round_trip() {
        let (tree, p, _, leaves) = sample();
        for offset in 0..=9 {
            let anchor = tree.caret_anchor(offset).unwrap();
            assert_eq!(tree.anchor_offset(anchor), Some(offset));
        }
        assert_eq!(tree.anchor_offset(Anchor { node: p, offset: 1 }), Some(2));
        assert_eq!(tree.anchor_offset(Anchor { node: leaves[3], offset: 9 }), Some(7));
    }

    #[test]
    fn test_split_text_keeps_markup_flag() {
        let (mut tree, _, strong, _) = sample();
        let open = tree.children(strong)[0];
        let tail = tree.split_text(open, 1).unwrap();
        assert_eq!(tree.text(open).unwrap().content, "*");
        assert!(tree.text(tail).unwrap().markup);
        assert_eq!(tree.full_text(), "abcd**x**");
        assert!(tree.split_text(open, 1).is_none());
    }

    #[test]
    fn test_replace_tombstones_old_subtree() {
        let (mut tree, p, strong, leaves) = sample();
        let em = tree.create_element(Tag::Emphasis, Some("*y*".into()));
        let y = tree.create_text("*y*", false);
        tree.append_child(em, y);
        assert!(tree.replace(strong, &[em]));
        assert!(!tree.contains(strong));
        assert!(!tree.contains(leaves[3]));
        assert_eq!(tree.parent(em), Some(p));
        assert_eq!(tree.full_text(), "abcd*y*");
    }

    #[test]
    fn test_splice_deletes_across_nodes_and_inserts() {
        let (mut tree, _, _, _) = sample();
        tree.splice(1..3, "Z");
        assert_eq!(tree.full_text(), "aZd**x**");
    }

    #[test]
    fn test_splice_into_empty_tree_creates_text() {
        let mut tree = DisplayTree::new();
        tree.splice(0..0, "hi");
        assert_eq!(tree.full_text(), "hi");
    }

    #[test]
    fn test_insert_text_at_isolates_new_node() {
        let (mut tree, _, _, _) = sample();
        let marker = tree.insert_text_at(1, "|", false);
        assert_eq!(tree.full_text(), "a|bcd**x**");
        assert_eq!(tree.node_range(marker), Some(1..2));
    }

    #[test]
    fn test_isolate_splits_both_sides() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let t = tree.create_text("abcdef", false);
        tree.append_child(root, t);
        let mid = tree.isolate(2..4).unwrap();
        assert_eq!(tree.text(mid).unwrap().content, "cd");
        assert_eq!(tree.children(root).len(), 3);
        assert_eq!(tree.full_text(), "abcdef");
    }

    #[test]
    fn test_serialize_uses_outermost_annotations() {
        let (mut tree, _, strong, _) = sample();
        let root = tree.root();
        let gap = tree.create_text("\n\n", false);
        tree.append_child(root, gap);
        assert_eq!(tree.serialize(), "abcd\n\n");
        tree.element_mut(strong).unwrap().active = true;
        assert_eq!(tree.serialize(), "abcd\n\n");
    }

    #[test]
    fn test_markup_visible_follows_active_ancestors() {
        let (mut tree, p, strong, leaves) = sample();
        assert!(!tree.markup_visible(leaves[2]));
        tree.element_mut(p).unwrap().active = true;
        assert!(tree.markup_visible(leaves[2]));
        tree.element_mut(p).unwrap().active = false;
        tree.element_mut(strong).unwrap().active = true;
        assert!(tree.markup_visible(leaves[4]));
    }

    #[test]
    fn test_clear_starts_new_epoch() {
        let mut tree = DisplayTree::new();
        let before = tree.epoch();
        tree.clear();
        assert_ne!(tree.epoch(), before);
    }
}
