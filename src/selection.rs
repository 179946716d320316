//! Selection tracking: which annotated elements the selection touches.

use std::collections::BTreeSet;

use tracing::debug;

use crate::surface::{DisplayTree, NodeId, Surface};

/// How an annotated element is currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Rendered,
    Source,
}

/// The annotated elements overlapped by the selection, tied to the tree
/// generation it was computed against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet {
    epoch: u64,
    nodes: BTreeSet<NodeId>,
}

impl ActiveSet {
    /// A set with no members, valid for any tree.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_nodes(tree: &DisplayTree, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            epoch: tree.epoch(),
            nodes: nodes.into_iter().collect(),
        }
    }

    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// The members, or nothing when the set belongs to another tree
    /// generation.
    pub fn members_in(&self, tree: &DisplayTree) -> BTreeSet<NodeId> {
        if self.epoch == tree.epoch() {
            self.nodes.clone()
        } else {
            BTreeSet::new()
        }
    }

    pub fn mode_of(&self, id: NodeId) -> DisplayMode {
        if self.contains(id) {
            DisplayMode::Source
        } else {
            DisplayMode::Rendered
        }
    }
}

/// Compute the annotated elements the current selection overlaps.
///
/// The selection's lowest common ancestor is walked twice: forward
/// pre-order from the start anchor to the end anchor, and reverse
/// pre-order from the end anchor back to the start anchor. Nodes seen by
/// both walks lie inside the selection; each text node among them
/// contributes its nearest annotated owner.
pub fn active_nodes(surface: &Surface) -> ActiveSet {
    let tree = surface.tree();
    let Some(selection) = surface.selection() else {
        debug!("no selection; nothing active");
        return ActiveSet::from_nodes(tree, []);
    };
    let (start, end) = (selection.start.node, selection.end.node);
    let Some(lca) = tree.lca(start, end) else {
        debug!(?start, ?end, "selection anchors are not in the tree");
        return ActiveSet::from_nodes(tree, []);
    };

    let forward = between(&tree.preorder(lca), start, end);
    let backward: BTreeSet<NodeId> = between(&tree.reverse_preorder(lca), end, start)
        .into_iter()
        .collect();

    let mut owners = BTreeSet::new();
    let mut touched_text = false;
    for node in forward.into_iter().filter(|n| backward.contains(n)) {
        if !tree.is_text(node) {
            continue;
        }
        touched_text = true;
        if let Some(owner) = tree.owner(node) {
            owners.insert(owner);
        }
    }
    if !touched_text && let Some(owner) = tree.owner(start) {
        owners.insert(owner);
    }
    ActiveSet::from_nodes(tree, owners)
}

/// The inclusive slice of `order` from `from` to `to`.
fn between(order: &[NodeId], from: NodeId, to: NodeId) -> Vec<NodeId> {
    let Some(first) = order.iter().position(|&n| n == from) else {
        return Vec::new();
    };
    let Some(last) = order[first..].iter().position(|&n| n == to) else {
        return Vec::new();
    };
    order[first..=first + last].to_vec()
}
