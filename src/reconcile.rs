//! Dual-form reconciliation.
//!
//! Elements leaving the active set are switched back to rendered form,
//! re-rendered from their current text when it no longer matches their
//! annotation. Elements entering the set are only marked; their text
//! already holds the source.

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::markdown::{TokenKind, parse, parse_inline};
use crate::perf::Stage;
use crate::render::{render, tag_for};
use crate::selection::{ActiveSet, active_nodes};
use crate::surface::{DisplayTree, Layout, NodeId, Surface};

/// Apply the difference between two active sets to the surface and return
/// the set that is now in effect.
///
/// Deactivations run before activations. When a deactivated element had
/// to be rebuilt, the selection is re-seated by offset and the active set
/// is recomputed against the rebuilt tree before anything is activated.
pub fn reconcile(surface: &mut Surface, previous: &ActiveSet, next: &ActiveSet) -> ActiveSet {
    let _scope = crate::perf::scope(Stage::Reconcile);
    let previous_members = previous.members_in(surface.tree());
    let mut next_members = next.members_in(surface.tree());

    let leaving: Vec<NodeId> = previous_members
        .difference(&next_members)
        .copied()
        .collect();
    let mut rebuilt = false;
    for node in leaving {
        let Some(element) = surface.tree_mut().element_mut(node) else {
            continue;
        };
        element.active = false;
        if is_stale(surface.tree(), node) {
            rebuilt |= surface.edit_tree(|tree| rerender(tree, node));
        }
    }

    if rebuilt {
        next_members = active_nodes(surface).members_in(surface.tree());
    }
    let tree = surface.tree_mut();
    for &node in &next_members {
        if let Some(element) = tree.element_mut(node) {
            element.active = true;
        }
    }
    ActiveSet::from_nodes(surface.tree(), next_members)
}

/// An element whose text was edited since it was rendered.
fn is_stale(tree: &DisplayTree, node: NodeId) -> bool {
    tree.element(node)
        .is_some_and(|e| e.markdown.as_deref() != Some(tree.text_content(node).as_str()))
}

/// Re-render `node` from its text content. If the text no longer parses to
/// the same kind of element on its own, the nearest annotated ancestor is
/// re-rendered instead. Top-level blocks accept whatever they parse to.
fn rerender(tree: &mut DisplayTree, node: NodeId) -> bool {
    let mut target = node;
    loop {
        match rebuild(tree, target) {
            Ok(Some(replacements)) => {
                debug!(?target, count = replacements.len(), "re-rendered stale element");
                return tree.replace(target, &replacements);
            }
            Ok(None) => {
                let Some(up) = tree.parent(target).and_then(|p| tree.owner(p)) else {
                    return false;
                };
                debug!(from = ?target, to = ?up, "shape changed; widening re-render");
                target = up;
            }
            Err(err) => {
                warn!(?target, %err, "stale element kept in source form");
                return false;
            }
        }
    }
}

/// Build the replacement for `target` as detached nodes, or `None` when the
/// text alone no longer produces the same kind of element.
fn rebuild(tree: &mut DisplayTree, target: NodeId) -> Result<Option<Vec<NodeId>>, ParseError> {
    let Some(element) = tree.element(target) else {
        return Ok(None);
    };
    let tag = element.tag.clone();
    let text = tree.text_content(target);
    let top_level = tree.parent(target) == Some(tree.root());

    match tag.layout() {
        Layout::Block => {
            let document = parse(&text)?;
            if top_level {
                return Ok(Some(
                    document.children.iter().map(|t| render(tree, t)).collect(),
                ));
            }
            match document.children.as_slice() {
                [only]
                    if only.kind != TokenKind::Space
                        && tag_for(&only.kind).is_some_and(|t| t.same_variant(&tag)) =>
                {
                    Ok(Some(vec![render(tree, only)]))
                }
                _ => Ok(None),
            }
        }
        Layout::Inline => {
            let Some(tokens) = parse_inline(&text)? else {
                return Ok(None);
            };
            match tokens.as_slice() {
                [only]
                    if only.span == (0..text.len())
                        && tag_for(&only.kind).is_some_and(|t| t.same_variant(&tag)) =>
                {
                    Ok(Some(vec![render(tree, only)]))
                }
                _ => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_document;
    use crate::surface::Tag;
    use proptest::prelude::*;

    fn surface(text: &str) -> Surface {
        let mut tree = DisplayTree::new();
        render_document(&mut tree, &parse(text).unwrap());
        Surface::new(tree)
    }

    fn step(surface: &mut Surface, previous: &ActiveSet) -> ActiveSet {
        let next = active_nodes(surface);
        reconcile(surface, previous, &next)
    }

    fn find(surface: &Surface, tag: &Tag) -> Option<NodeId> {
        let tree = surface.tree();
        tree.preorder(tree.root())
            .into_iter()
            .find(|&n| tree.element(n).is_some_and(|e| &e.tag == tag))
    }

    fn active_tags(surface: &Surface) -> Vec<Tag> {
        let tree = surface.tree();
        tree.preorder(tree.root())
            .into_iter()
            .filter_map(|n| tree.element(n))
            .filter(|e| e.active)
            .map(|e| e.tag.clone())
            .collect()
    }

    #[test]
    fn test_caret_in_bold_marks_strong_active() {
        let mut surface = surface("**bold** x");
        surface.set_caret(4);
        let set = step(&mut surface, &ActiveSet::empty());
        assert_eq!(set.len(), 1);
        assert_eq!(active_tags(&surface), vec![Tag::Strong]);
        let strong = find(&surface, &Tag::Strong).unwrap();
        let first = surface.tree().children(strong)[0];
        assert!(surface.tree().markup_visible(first));
    }

    #[test]
    fn test_leaving_bold_restores_original_form() {
        let mut surface = surface("**bold** x");
        let pristine = surface.tree().clone();
        surface.set_caret(4);
        let active = step(&mut surface, &ActiveSet::empty());
        surface.set_selection(None);
        let after = step(&mut surface, &active);
        assert!(after.is_empty());
        assert_eq!(surface.tree(), &pristine);
        let strong = find(&surface, &Tag::Strong).unwrap();
        let markup = surface.tree().children(strong)[0];
        assert!(!surface.tree().markup_visible(markup));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut surface = surface("# Title\n\nsome *em* and **strong**\n");
        surface.set_caret(14);
        let next = active_nodes(&surface);
        let first = reconcile(&mut surface, &ActiveSet::empty(), &next);
        let snapshot = surface.clone();
        let second = reconcile(&mut surface, &first, &first);
        assert_eq!(first, second);
        assert_eq!(surface, snapshot);
    }

    #[test]
    fn test_edited_element_is_rerendered_on_leave() {
        let mut surface = surface("**bold** x");
        surface.set_caret(4);
        let active = step(&mut surface, &ActiveSet::empty());
        let strong = find(&surface, &Tag::Strong).unwrap();
        let payload = surface.tree().children(strong)[1];
        surface.tree_mut().set_text(payload, "bolder");
        surface.set_caret(12);
        step(&mut surface, &active);
        let rebuilt = find(&surface, &Tag::Strong).unwrap();
        assert_ne!(rebuilt, strong);
        let element = surface.tree().element(rebuilt).unwrap();
        assert_eq!(element.markdown.as_deref(), Some("**bolder**"));
        assert!(!element.active);
        assert_eq!(surface.tree().full_text(), "**bolder** x");
        assert_eq!(surface.caret_offset(), Some(12));
    }

    #[test]
    fn test_broken_inline_widens_to_block() {
        let mut surface = surface("a **b** c");
        surface.set_caret(5);
        let active = step(&mut surface, &ActiveSet::empty());
        let strong = find(&surface, &Tag::Strong).unwrap();
        let closing = surface.tree().children(strong)[2];
        surface.tree_mut().set_text(closing, "");
        surface.set_caret(0);
        step(&mut surface, &active);
        assert!(find(&surface, &Tag::Strong).is_none());
        assert_eq!(surface.tree().full_text(), "a **b c");
        let paragraph = find(&surface, &Tag::Paragraph).unwrap();
        assert_eq!(
            surface.tree().element(paragraph).unwrap().markdown.as_deref(),
            Some("a **b c")
        );
    }

    #[test]
    fn test_stale_previous_set_is_ignored() {
        let mut other = surface("*y*");
        other.set_caret(1);
        let stale = active_nodes(&other);
        let mut surface = surface("*x*");
        surface.set_caret(1);
        let set = step(&mut surface, &stale);
        assert_eq!(set.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_reconcile_twice_changes_nothing(offset in 0usize..40) {
            let text = "# Head\n\n- one *two*\n- three `four`\n\n> quote **five**\n";
            let mut surface = surface(text);
            surface.set_caret(offset.min(text.len()));
            let first = step(&mut surface, &ActiveSet::empty());
            let snapshot = surface.clone();
            let again = reconcile(&mut surface, &first, &first);
            prop_assert_eq!(&again, &first);
            prop_assert_eq!(&surface, &snapshot);
            prop_assert_eq!(surface.tree().full_text(), text);
        }
    }
}
