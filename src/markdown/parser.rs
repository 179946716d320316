//! Markdown parsing with comrak.
//!
//! comrak reports 1-based line/column source positions. They are converted
//! to byte ranges here and then normalized so that every token's span lies
//! inside its parent and after its previous sibling.

use std::ops::Range;

use comrak::nodes::{AstNode, ListType, NodeValue, Sourcepos};
use comrak::{Arena, Options, parse_document};

use super::token::{Token, TokenKind};
use crate::error::ParseError;
use crate::perf::Stage;

/// Deepest token nesting accepted before a parse is rejected.
pub const MAX_NESTING: usize = 48;

/// Parse markdown into a document token whose span is the whole text.
///
/// Top-level source not covered by any block becomes [`TokenKind::Space`]
/// tokens, so the document's children tile the text exactly.
///
/// # Errors
///
/// Returns [`ParseError`] when the structure is nested deeper than
/// [`MAX_NESTING`] or comrak reports block positions that cannot be ordered.
///
/// # Example
///
/// ```
/// use synapse::markdown::{parse, TokenKind};
///
/// let doc = parse("# Hello").unwrap();
/// assert_eq!(doc.children[0].kind, TokenKind::Heading { depth: 1, setext: false });
/// assert_eq!(doc.children[0].raw, "# Hello");
/// ```
pub fn parse(text: &str) -> Result<Token<'_>, ParseError> {
    let _scope = crate::perf::scope(Stage::Parse);
    let arena = Arena::new();
    let options = create_options();
    let root = parse_document(&arena, text, &options);

    let converter = Converter {
        text,
        lines: LineIndex::new(text),
    };
    let mut document = Token::new(TokenKind::Document, 0..text.len(), text);
    let mut cursor = 0;
    for node in root.children() {
        let Some(token) = converter.convert(node, cursor, text.len(), 1)? else {
            continue;
        };
        if token.span.start > cursor {
            document
                .children
                .push(Token::new(TokenKind::Space, cursor..token.span.start, text));
        }
        cursor = token.span.end;
        document.children.push(token);
    }
    if cursor < text.len() {
        document
            .children
            .push(Token::new(TokenKind::Space, cursor..text.len(), text));
    }
    Ok(document)
}

/// Parse a fragment that should consist of inline content only.
///
/// Returns `None` when the fragment does not parse as a single paragraph
/// spanning the whole text (for example `# x` or text with a blank line).
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_inline(text: &str) -> Result<Option<Vec<Token<'_>>>, ParseError> {
    let mut document = parse(text)?;
    if document.children.len() != 1 {
        return Ok(None);
    }
    let Some(paragraph) = document.children.pop() else {
        return Ok(None);
    };
    if paragraph.kind != TokenKind::Paragraph || paragraph.span != (0..text.len()) {
        return Ok(None);
    }
    Ok(Some(paragraph.children))
}

fn create_options() -> Options {
    let mut options = Options::default();

    // GFM extensions that map onto token kinds
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;

    // Inline positions after a multi-line code span are only tracked with this on.
    options.render.sourcepos = true;

    options
}

struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            starts,
            len: text.len(),
        }
    }

    /// Byte offset of a 1-based line/column. `inclusive_end` turns the column
    /// of a last character into an exclusive end.
    fn offset(&self, line: usize, column: usize, inclusive_end: bool) -> usize {
        let Some(start) = line.checked_sub(1).and_then(|i| self.starts.get(i)) else {
            return self.len;
        };
        let col = if inclusive_end {
            column
        } else {
            column.saturating_sub(1)
        };
        (start + col).min(self.len)
    }
}

struct Converter<'a> {
    text: &'a str,
    lines: LineIndex,
}

impl<'a> Converter<'a> {
    fn convert<'n>(
        &self,
        node: &'n AstNode<'n>,
        lo: usize,
        hi: usize,
        depth: usize,
    ) -> Result<Option<Token<'a>>, ParseError> {
        let (kind, sourcepos) = {
            let data = node.data.borrow();
            (kind_of(&data.value), data.sourcepos)
        };

        let reported = self.span_of(sourcepos);
        if depth > MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                depth,
                limit: MAX_NESTING,
                offset: reported.as_ref().map_or(lo, |s| s.start),
            });
        }

        let autolink = self.is_autolink(node);
        let mut known = reported.is_some() && !autolink;
        let mut span = match reported {
            Some(span) if matches!(kind, TokenKind::CodeSpan { .. }) => {
                self.fence_code_span(span, lo, hi)
            }
            Some(span) if !autolink => span,
            _ => lo..hi,
        };
        if kind.is_block() && known {
            if span.start < lo && span.end <= lo && !span.is_empty() {
                return Err(ParseError::OverlappingBlocks {
                    kind: kind.name(),
                    start: span.start,
                    previous_end: lo,
                });
            }
            if span.start > hi {
                return Err(ParseError::SpanOutOfBounds {
                    kind: kind.name(),
                    start: span.start,
                    end: span.end,
                    parent_start: lo,
                    parent_end: hi,
                });
            }
        }
        span = self.clamp(span, lo, hi);

        match &kind {
            TokenKind::SoftBreak | TokenKind::LineBreak => {
                span = self.fit_break(span, lo, hi);
            }
            TokenKind::Link { .. } if autolink => {
                if let Some(found) = self.locate_autolink(node, lo, hi) {
                    span = found;
                    known = true;
                }
            }
            TokenKind::Text if !known => {
                let literal = match &node.data.borrow().value {
                    NodeValue::Text(literal) => literal.clone(),
                    _ => String::new(),
                };
                span = self.locate(&literal, lo, hi).unwrap_or(lo..lo);
            }
            TokenKind::Text if node.next_sibling().is_some_and(|next| self.is_autolink(next)) => {
                // comrak truncates the literal without moving the end position.
                if let NodeValue::Text(literal) = &node.data.borrow().value
                    && self.text[span.clone()].starts_with(literal.as_str())
                {
                    span = span.start..span.start + literal.len();
                }
            }
            _ => {}
        }

        let mut children: Vec<Token> = Vec::new();
        if kind.has_children() {
            let mut cursor = span.start;
            for child in node.children() {
                // Text ahead of a bare URL keeps the position of the scheme
                // the URL took back from it, so the URL may start before the
                // cursor but must reach past it.
                let from = match (children.last(), autolink_text(child)) {
                    (Some(prev), Some(written))
                        if prev.kind == TokenKind::Text && self.is_autolink(child) =>
                    {
                        let reach = cursor.saturating_sub(written.len().saturating_sub(1));
                        floor_boundary(self.text, reach).max(prev.span.start)
                    }
                    _ => cursor,
                };
                let Some(token) = self.convert(child, from, span.end, depth + 1)? else {
                    continue;
                };
                if token.span.start < cursor
                    && let Some(prev) = children.pop()
                {
                    let trimmed = prev.span.start..token.span.start.max(prev.span.start);
                    if !trimmed.is_empty() {
                        children.push(Token::new(TokenKind::Text, trimmed, self.text));
                    }
                }
                cursor = token.span.end;
                children.push(token);
            }
            if !known {
                span = match (children.first(), children.last()) {
                    (Some(first), Some(last)) => first.span.start..last.span.end,
                    _ => lo..lo,
                };
            }
        }

        if span.is_empty() && children.is_empty() && !kind.is_block() {
            return Ok(None);
        }

        let mut token = Token::new(kind, span, self.text);
        token.children = children;
        Ok(Some(token))
    }

    fn span_of(&self, pos: Sourcepos) -> Option<Range<usize>> {
        if pos.start.line == 0 {
            return None;
        }
        let start = self.lines.offset(pos.start.line, pos.start.column, false);
        let end = self
            .lines
            .offset(pos.end.line, pos.end.column, true)
            .max(start);
        Some(start..end)
    }

    fn clamp(&self, span: Range<usize>, lo: usize, hi: usize) -> Range<usize> {
        let start = floor_boundary(self.text, span.start.clamp(lo, hi)).max(lo);
        let end = ceil_boundary(self.text, span.end.clamp(start, hi)).min(hi);
        start..end.max(start)
    }

    /// Soft and hard breaks must own the newline they stand for.
    fn fit_break(&self, span: Range<usize>, lo: usize, hi: usize) -> Range<usize> {
        if self.text[span.clone()].ends_with('\n') {
            return span;
        }
        let from = span.start.max(lo);
        match self.text[from..hi].find('\n') {
            Some(i) => {
                let newline = from + i;
                let start = if newline > lo && self.text.as_bytes()[newline - 1] == b'\r' {
                    span.start.min(newline - 1)
                } else {
                    span.start.min(newline)
                };
                start..newline + 1
            }
            None => span,
        }
    }

    /// Code span positions cover the content only; widen them over the
    /// backtick fences.
    fn fence_code_span(&self, span: Range<usize>, lo: usize, hi: usize) -> Range<usize> {
        let bytes = self.text.as_bytes();
        let mut start = span.start.min(bytes.len());
        while start > lo && bytes[start - 1] == b'`' {
            start -= 1;
        }
        let mut end = span.end.clamp(start, bytes.len());
        while end < hi && bytes[end] == b'`' {
            end += 1;
        }
        start..end
    }

    /// Links whose source does not open with `[`: `<scheme:...>`, bare URLs
    /// and bare email addresses. comrak leaves their positions unset or
    /// shifted.
    fn is_autolink(&self, node: &AstNode<'_>) -> bool {
        let data = node.data.borrow();
        if !matches!(data.value, NodeValue::Link(_)) {
            return false;
        }
        self.span_of(data.sourcepos)
            .is_none_or(|span| self.text.as_bytes().get(span.start) != Some(&b'['))
    }

    /// Find an autolink by its written text, angle brackets included when
    /// present.
    fn locate_autolink(&self, node: &AstNode<'_>, lo: usize, hi: usize) -> Option<Range<usize>> {
        let written = autolink_text(node)?;
        let bracketed = format!("<{written}>");
        let pointy = self.locate(&bracketed, lo, hi);
        let bare = self.locate(&written, lo, hi);
        match (pointy, bare) {
            (Some(pointy), Some(bare)) if pointy.start < bare.start => Some(pointy),
            (_, Some(bare)) => Some(bare),
            (pointy, None) => pointy,
        }
    }

    fn locate(&self, needle: &str, lo: usize, hi: usize) -> Option<Range<usize>> {
        if needle.is_empty() {
            return None;
        }
        let at = self.text[lo..hi].find(needle)?;
        Some(lo + at..lo + at + needle.len())
    }
}

/// The link text of a link node, which autolinks take verbatim from the
/// source.
fn autolink_text(node: &AstNode<'_>) -> Option<String> {
    if !matches!(node.data.borrow().value, NodeValue::Link(_)) {
        return None;
    }
    match &node.first_child()?.data.borrow().value {
        NodeValue::Text(literal) => Some(literal.clone()),
        _ => None,
    }
}

fn floor_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn kind_of(value: &NodeValue) -> TokenKind {
    match value {
        NodeValue::Document => TokenKind::Document,
        NodeValue::Paragraph => TokenKind::Paragraph,
        NodeValue::Heading(heading) => TokenKind::Heading {
            depth: heading.level,
            setext: heading.setext,
        },
        NodeValue::List(list) => TokenKind::List {
            ordered: matches!(list.list_type, ListType::Ordered),
            start: list.start,
        },
        NodeValue::Item(_) => TokenKind::ListItem {
            task: false,
            checked: false,
        },
        NodeValue::TaskItem(symbol) => TokenKind::ListItem {
            task: true,
            checked: symbol.is_some(),
        },
        NodeValue::BlockQuote => TokenKind::BlockQuote,
        NodeValue::CodeBlock(code) => TokenKind::CodeBlock {
            lang: code.info.split_whitespace().next().map(str::to_string),
            fenced: code.fenced,
            literal: code.literal.clone(),
        },
        NodeValue::Table(_) => TokenKind::Table,
        NodeValue::TableRow(header) => TokenKind::TableRow { header: *header },
        NodeValue::TableCell => TokenKind::TableCell,
        NodeValue::ThematicBreak => TokenKind::ThematicBreak,
        NodeValue::HtmlBlock(_) => TokenKind::Html { block: true },
        NodeValue::HtmlInline(_) => TokenKind::Html { block: false },
        NodeValue::Emph => TokenKind::Emphasis,
        NodeValue::Strong => TokenKind::Strong,
        NodeValue::Strikethrough => TokenKind::Strikethrough,
        NodeValue::Link(link) => TokenKind::Link {
            url: link.url.clone(),
            title: link.title.clone(),
        },
        NodeValue::Image(link) => TokenKind::Image {
            url: link.url.clone(),
            title: link.title.clone(),
        },
        NodeValue::Code(code) => TokenKind::CodeSpan {
            literal: code.literal.clone(),
        },
        NodeValue::Text(_) => TokenKind::Text,
        NodeValue::LineBreak => TokenKind::LineBreak,
        NodeValue::SoftBreak => TokenKind::SoftBreak,
        // Anything else is kept as opaque source.
        other => TokenKind::Html {
            block: other.block(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn concat_leaves(token: &Token<'_>, out: &mut String) {
        if token.children.is_empty() {
            out.push_str(token.raw);
            return;
        }
        for (i, child) in token.children.iter().enumerate() {
            let gap_start = if i == 0 {
                token.span.start
            } else {
                token.children[i - 1].span.end
            };
            out.push_str(&token.raw[gap_start - token.span.start..child.span.start - token.span.start]);
            concat_leaves(child, out);
        }
        if let Some(last) = token.children.last() {
            out.push_str(&token.raw[last.span.end - token.span.start..]);
        }
    }

    fn assert_well_formed(token: &Token<'_>, text: &str) {
        assert_eq!(&text[token.span.clone()], token.raw);
        let mut cursor = token.span.start;
        for child in &token.children {
            assert!(child.span.start >= cursor, "{child:?} starts before {cursor}");
            assert!(child.span.end <= token.span.end, "{child:?} ends past parent");
            cursor = child.span.end;
            assert_well_formed(child, text);
        }
    }

    #[test]
    fn test_heading_scenario() {
        let doc = parse("# Hello").unwrap();
        assert_eq!(doc.children.len(), 1);
        let heading = &doc.children[0];
        assert_eq!(
            heading.kind,
            TokenKind::Heading {
                depth: 1,
                setext: false
            }
        );
        assert_eq!(heading.raw, "# Hello");
        assert!(heading.walk().any(|t| t.kind == TokenKind::Text && t.raw == "Hello"));
    }

    #[test]
    fn test_root_children_tile_the_text() {
        let text = "# Title\n\nSome *text* here.\n\n- one\n- two\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.raw, text);
        let mut cursor = 0;
        for child in &doc.children {
            assert_eq!(child.span.start, cursor);
            cursor = child.span.end;
        }
        assert_eq!(cursor, text.len());
        assert!(doc.children.iter().any(|t| t.kind == TokenKind::Space));
    }

    #[test]
    fn test_strong_keeps_delimiters_in_raw() {
        let doc = parse("**bold**").unwrap();
        let strong = doc
            .walk()
            .find(|t| t.kind == TokenKind::Strong)
            .expect("strong token");
        assert_eq!(strong.raw, "**bold**");
        assert_eq!(strong.children[0].raw, "bold");
    }

    #[test]
    fn test_list_and_task_items() {
        let doc = parse("- [ ] todo\n- [x] done\n").unwrap();
        let list = &doc.children[0];
        assert!(matches!(list.kind, TokenKind::List { ordered: false, .. }));
        let items: Vec<&TokenKind> = list.children.iter().map(|t| &t.kind).collect();
        assert_eq!(
            items,
            vec![
                &TokenKind::ListItem {
                    task: true,
                    checked: false
                },
                &TokenKind::ListItem {
                    task: true,
                    checked: true
                },
            ]
        );
    }

    #[test]
    fn test_fenced_code_block_keeps_literal_and_lang() {
        let doc = parse("```rust\nfn main() {}\n```\n").unwrap();
        let code = &doc.children[0];
        match &code.kind {
            TokenKind::CodeBlock {
                lang,
                fenced,
                literal,
            } => {
                assert_eq!(lang.as_deref(), Some("rust"));
                assert!(fenced);
                assert_eq!(literal, "fn main() {}\n");
            }
            other => panic!("expected code block, got {other:?}"),
        }
        assert!(code.raw.starts_with("```rust"));
    }

    #[test]
    fn test_empty_text_has_no_children() {
        let doc = parse("").unwrap();
        assert!(doc.children.is_empty());
        assert_eq!(doc.span, 0..0);
    }

    #[test]
    fn test_blank_only_text_is_one_space_token() {
        let doc = parse("\n\n").unwrap();
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.children[0].kind, TokenKind::Space);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let text = format!("{} deep", ">".repeat(MAX_NESTING + 4));
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { limit, .. } if limit == MAX_NESTING));
    }

    #[test]
    fn test_parse_inline_accepts_single_run() {
        let tokens = parse_inline("*a*").unwrap().expect("inline run");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Emphasis);
        assert_eq!(tokens[0].raw, "*a*");
    }

    #[test]
    fn test_parse_inline_rejects_blocks() {
        assert!(parse_inline("# x").unwrap().is_none());
        assert!(parse_inline("a\n\nb").unwrap().is_none());
    }

    #[test]
    fn test_multibyte_text_spans_stay_on_boundaries() {
        let text = "é **ü** ñ\n";
        let doc = parse(text).unwrap();
        assert_well_formed(&doc, text);
    }

    fn find<'t>(doc: &'t Token<'t>, pred: impl Fn(&TokenKind) -> bool) -> &'t Token<'t> {
        doc.walk().find(|t| pred(&t.kind)).expect("token of the requested kind")
    }

    #[test]
    fn test_code_span_raw_includes_backtick_fences() {
        let text = "use `let x` here";
        let doc = parse(text).unwrap();
        let code = find(&doc, |k| matches!(k, TokenKind::CodeSpan { .. }));
        assert_eq!(code.raw, "`let x`");
        assert_eq!(code.span, 4..11);
        assert_well_formed(&doc, text);
    }

    #[test]
    fn test_double_backtick_code_span_keeps_padding_inside() {
        let doc = parse("a `` ` `` b").unwrap();
        let code = find(&doc, |k| matches!(k, TokenKind::CodeSpan { .. }));
        assert_eq!(code.raw, "`` ` ``");
        assert_eq!(
            code.kind,
            TokenKind::CodeSpan {
                literal: "`".into()
            }
        );
    }

    #[test]
    fn test_code_span_across_lines_keeps_both_fences() {
        let text = "`a\nb` after\n";
        let doc = parse(text).unwrap();
        let code = find(&doc, |k| matches!(k, TokenKind::CodeSpan { .. }));
        assert_eq!(code.raw, "`a\nb`");
        let after = doc
            .walk()
            .find(|t| t.kind == TokenKind::Text && t.raw.contains("after"))
            .unwrap();
        assert_eq!(after.raw, " after");
    }

    #[test]
    fn test_bare_url_keeps_its_scheme() {
        let text = "see http://example.com now\n";
        let doc = parse(text).unwrap();
        let link = find(&doc, |k| matches!(k, TokenKind::Link { .. }));
        assert_eq!(link.raw, "http://example.com");
        assert_eq!(link.children[0].raw, "http://example.com");
        let paragraph = &doc.children[0];
        let raws: Vec<&str> = paragraph.children.iter().map(|t| t.raw).collect();
        assert_eq!(raws, vec!["see ", "http://example.com", " now"]);
        assert_well_formed(&doc, text);
    }

    #[test]
    fn test_angle_autolink_covers_its_brackets() {
        let text = "see <http://example.com> now\n";
        let doc = parse(text).unwrap();
        let link = find(&doc, |k| matches!(k, TokenKind::Link { .. }));
        assert_eq!(link.raw, "<http://example.com>");
        assert_eq!(link.children[0].raw, "http://example.com");
        let paragraph = &doc.children[0];
        let raws: Vec<&str> = paragraph.children.iter().map(|t| t.raw).collect();
        assert_eq!(raws, vec!["see ", "<http://example.com>", " now"]);
    }

    #[test]
    fn test_bare_email_is_located_in_source() {
        let text = "mail ann@example.com today\n";
        let doc = parse(text).unwrap();
        let link = find(&doc, |k| matches!(k, TokenKind::Link { .. }));
        assert_eq!(link.raw, "ann@example.com");
        match &link.kind {
            TokenKind::Link { url, .. } => assert_eq!(url, "mailto:ann@example.com"),
            other => panic!("expected link, got {other:?}"),
        }
        let mut rebuilt = String::new();
        concat_leaves(&doc, &mut rebuilt);
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_text_before_several_autolinks_is_not_duplicated() {
        let text = "ann@example.com http://example.com\n";
        let doc = parse(text).unwrap();
        let paragraph = &doc.children[0];
        let raws: Vec<&str> = paragraph.children.iter().map(|t| t.raw).collect();
        assert_eq!(raws, vec!["ann@example.com", " ", "http://example.com"]);
        assert_well_formed(&doc, text);
    }

    #[test]
    fn test_bracket_links_keep_reported_span() {
        let doc = parse("a [site](http://example.com) b").unwrap();
        let link = find(&doc, |k| matches!(k, TokenKind::Link { .. }));
        assert_eq!(link.raw, "[site](http://example.com)");
        assert_eq!(link.children[0].raw, "site");
    }

    proptest! {
        #[test]
        fn prop_tokens_are_nested_and_round_trip(
            text in proptest::string::string_regex(
                "([#>*_`~\\-\\[\\]()|<:/.@ a-z0-9é]{0,12}\n{0,2}){0,8}"
            ).unwrap()
        ) {
            if let Ok(doc) = parse(&text) {
                assert_well_formed(&doc, &text);
                let mut rebuilt = String::new();
                concat_leaves(&doc, &mut rebuilt);
                prop_assert_eq!(rebuilt, text);
            }
        }
    }
}
