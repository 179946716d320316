//! Annotated rendering: token tree to display tree.
//!
//! Every element produced from a token carries a copy of the token's raw
//! span. The text nodes under an element always spell out that raw span
//! exactly; syntax characters are kept as markup text nodes so they can be
//! hidden or shown without changing the text.

use tracing::warn;

use crate::error::RenderError;
use crate::markdown::{Token, TokenKind};
use crate::perf::Stage;
use crate::surface::{DisplayTree, NodeId, Tag};

/// A raw span cut around its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupSplit<'a> {
    pub prefix: &'a str,
    pub payload: &'a str,
    pub suffix: &'a str,
}

/// Characters whose runs open an inline or heading construct.
const OPENING_SYNTAX: &[char] = &['*', '_', '~', '`', '#', '[', '<'];

/// Split `raw` into `prefix + payload + suffix` by locating `payload`
/// inside it.
///
/// The search starts after the opening delimiter run, so `**a**` with
/// payload `a` splits as `**`, `a`, `**` and a code span whose payload is
/// itself a backtick still finds the inner one.
///
/// # Errors
///
/// [`RenderError::PayloadNotFound`] when `payload` does not occur in `raw`.
pub fn split_markup<'a>(raw: &'a str, payload: &str) -> Result<MarkupSplit<'a>, RenderError> {
    let lead = opening_len(raw);
    let at = raw[lead..]
        .find(payload)
        .map(|i| i + lead)
        .or_else(|| raw.find(payload))
        .ok_or_else(|| RenderError::PayloadNotFound {
            raw: raw.to_string(),
            payload: payload.to_string(),
        })?;
    let end = at + payload.len();
    Ok(MarkupSplit {
        prefix: &raw[..at],
        payload: &raw[at..end],
        suffix: &raw[end..],
    })
}

/// Length of the opening delimiter of `raw`: an optional `!`, a run of one
/// syntax character, then at most one space or tab.
fn opening_len(raw: &str) -> usize {
    let bang = usize::from(raw.starts_with('!'));
    let rest = &raw[bang..];
    let Some(delimiter) = rest.chars().next().filter(|c| OPENING_SYNTAX.contains(c)) else {
        return bang;
    };
    let run = rest.len() - rest.trim_start_matches(delimiter).len();
    let pad = usize::from(rest[run..].starts_with([' ', '\t']));
    bang + run + pad
}

/// Display tag for a token kind. `None` for kinds that render as bare text.
pub fn tag_for(kind: &TokenKind) -> Option<Tag> {
    let tag = match kind {
        TokenKind::Document | TokenKind::Space | TokenKind::Text | TokenKind::SoftBreak => {
            return None;
        }
        TokenKind::Paragraph => Tag::Paragraph,
        TokenKind::Heading { depth, .. } => Tag::Heading(*depth),
        TokenKind::List { ordered, start } => Tag::List {
            ordered: *ordered,
            start: *start,
        },
        TokenKind::ListItem { task, checked } => Tag::ListItem {
            task: *task,
            checked: *checked,
        },
        TokenKind::BlockQuote => Tag::BlockQuote,
        TokenKind::CodeBlock { lang, .. } => Tag::CodeBlock { lang: lang.clone() },
        TokenKind::Table => Tag::Table,
        TokenKind::TableRow { header } => Tag::TableRow { header: *header },
        TokenKind::TableCell => Tag::TableCell,
        TokenKind::ThematicBreak => Tag::Rule,
        TokenKind::Html { block } => Tag::Html { block: *block },
        TokenKind::Emphasis => Tag::Emphasis,
        TokenKind::Strong => Tag::Strong,
        TokenKind::Strikethrough => Tag::Strikethrough,
        TokenKind::Link { url, .. } => Tag::Link { url: url.clone() },
        TokenKind::Image { url, .. } => Tag::Image { url: url.clone() },
        TokenKind::CodeSpan { .. } => Tag::CodeSpan,
        TokenKind::LineBreak => Tag::LineBreak,
    };
    Some(tag)
}

/// Render a whole document into `tree`, discarding what it held before.
pub fn render_document(tree: &mut DisplayTree, document: &Token<'_>) {
    let _scope = crate::perf::scope(Stage::Render);
    tree.clear();
    let root = tree.root();
    append_children(tree, root, document, 0..document.raw.len(), false);
}

/// Render one token into `tree` as a detached subtree and return its root.
///
/// Bare text kinds come back as a single text node; everything else as an
/// annotated element.
pub fn render(tree: &mut DisplayTree, token: &Token<'_>) -> NodeId {
    let Some(tag) = tag_for(&token.kind) else {
        if token.kind == TokenKind::Document {
            let root = tree.create_element(Tag::Root, None);
            append_children(tree, root, token, 0..token.raw.len(), false);
            return root;
        }
        return tree.create_text(token.raw, false);
    };
    let element = tree.create_element(tag, Some(token.raw.to_string()));

    match &token.kind {
        TokenKind::ThematicBreak => {
            let rule = tree.create_text(token.raw, true);
            tree.append_child(element, rule);
        }
        TokenKind::Html { .. } | TokenKind::CodeBlock { fenced: false, .. } => {
            let text = tree.create_text(token.raw, false);
            tree.append_child(element, text);
        }
        TokenKind::CodeBlock { literal, .. } | TokenKind::CodeSpan { literal } => {
            match split_markup(token.raw, literal) {
                Ok(split) => {
                    push_markup(tree, element, split.prefix);
                    let payload = tree.create_text(split.payload, false);
                    tree.append_child(element, payload);
                    push_markup(tree, element, split.suffix);
                }
                Err(err) => verbatim(tree, element, token, &err),
            }
        }
        TokenKind::LineBreak => match split_markup(token.raw, "\n") {
            Ok(split) => {
                push_markup(tree, element, split.prefix);
                let newline = tree.create_text(split.payload, false);
                tree.append_child(element, newline);
                push_markup(tree, element, split.suffix);
            }
            Err(err) => verbatim(tree, element, token, &err),
        },
        TokenKind::Heading { .. }
        | TokenKind::Emphasis
        | TokenKind::Strong
        | TokenKind::Strikethrough
        | TokenKind::Link { .. }
        | TokenKind::Image { .. } => {
            let region = token.children_region().unwrap_or(0..0);
            let payload = &token.raw[region.clone()];
            match split_markup(token.raw, payload) {
                Ok(split) => {
                    push_markup(tree, element, split.prefix);
                    append_children(tree, element, token, region, true);
                    push_markup(tree, element, split.suffix);
                }
                Err(err) => verbatim(tree, element, token, &err),
            }
        }
        _ => append_children(tree, element, token, 0..token.raw.len(), true),
    }
    element
}

/// Render the children of `token` that fall inside `region` (relative to
/// the token), with the source between them as text nodes.
fn append_children(
    tree: &mut DisplayTree,
    parent: NodeId,
    token: &Token<'_>,
    region: std::ops::Range<usize>,
    gaps_are_markup: bool,
) {
    let base = token.span.start;
    let mut cursor = region.start;
    for child in &token.children {
        let start = child.span.start - base;
        if start > cursor {
            let gap = tree.create_text(&token.raw[cursor..start], gaps_are_markup);
            tree.append_child(parent, gap);
        }
        let node = render(tree, child);
        tree.append_child(parent, node);
        cursor = child.span.end - base;
    }
    if region.end > cursor {
        let gap = tree.create_text(&token.raw[cursor..region.end], gaps_are_markup);
        tree.append_child(parent, gap);
    }
}

fn push_markup(tree: &mut DisplayTree, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    let node = tree.create_text(text, true);
    tree.append_child(parent, node);
}

fn verbatim(tree: &mut DisplayTree, element: NodeId, token: &Token<'_>, err: &RenderError) {
    warn!(kind = token.kind.name(), span = ?token.span, %err, "rendering raw span verbatim");
    crate::perf::log_event("render.fallback", format!("{} {:?}", token.kind.name(), token.span));
    let text = tree.create_text(token.raw, false);
    tree.append_child(element, text);
}
