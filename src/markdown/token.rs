//! Token tree types.

use std::ops::Range;

/// The closed set of token kinds the parser produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Document,
    /// Blank lines between top-level blocks.
    Space,
    Paragraph,
    Heading {
        depth: u8,
        setext: bool,
    },
    List {
        ordered: bool,
        start: usize,
    },
    ListItem {
        task: bool,
        checked: bool,
    },
    BlockQuote,
    CodeBlock {
        lang: Option<String>,
        fenced: bool,
        literal: String,
    },
    Table,
    TableRow {
        header: bool,
    },
    TableCell,
    ThematicBreak,
    Html {
        block: bool,
    },
    Emphasis,
    Strong,
    Strikethrough,
    Link {
        url: String,
        title: String,
    },
    Image {
        url: String,
        title: String,
    },
    CodeSpan {
        literal: String,
    },
    Text,
    LineBreak,
    SoftBreak,
}

impl TokenKind {
    /// Whether tokens of this kind take part in block layout.
    pub const fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Space
                | Self::Paragraph
                | Self::Heading { .. }
                | Self::List { .. }
                | Self::ListItem { .. }
                | Self::BlockQuote
                | Self::CodeBlock { .. }
                | Self::Table
                | Self::TableRow { .. }
                | Self::TableCell
                | Self::ThematicBreak
                | Self::Html { block: true }
        )
    }

    /// Whether the parser descends into nodes of this kind.
    pub const fn has_children(&self) -> bool {
        !matches!(
            self,
            Self::Space
                | Self::CodeBlock { .. }
                | Self::ThematicBreak
                | Self::Html { .. }
                | Self::CodeSpan { .. }
                | Self::Text
                | Self::LineBreak
                | Self::SoftBreak
        )
    }

    /// Stable lowercase name used in logs and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Space => "space",
            Self::Paragraph => "paragraph",
            Self::Heading { .. } => "heading",
            Self::List { .. } => "list",
            Self::ListItem { .. } => "list-item",
            Self::BlockQuote => "blockquote",
            Self::CodeBlock { .. } => "code",
            Self::Table => "table",
            Self::TableRow { .. } => "table-row",
            Self::TableCell => "table-cell",
            Self::ThematicBreak => "hr",
            Self::Html { .. } => "html",
            Self::Emphasis => "em",
            Self::Strong => "strong",
            Self::Strikethrough => "del",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
            Self::CodeSpan { .. } => "codespan",
            Self::Text => "text",
            Self::LineBreak => "br",
            Self::SoftBreak => "softbreak",
        }
    }
}

/// A node in the parse tree together with the exact source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Byte range into the parsed text.
    pub span: Range<usize>,
    /// The source slice covered by `span`.
    pub raw: &'a str,
    pub children: Vec<Token<'a>>,
}

impl<'a> Token<'a> {
    pub(crate) fn new(kind: TokenKind, span: Range<usize>, source: &'a str) -> Self {
        Self {
            raw: &source[span.clone()],
            kind,
            span,
            children: Vec::new(),
        }
    }

    /// Byte range covered by the children, relative to this token's start.
    pub fn children_region(&self) -> Option<Range<usize>> {
        let first = self.children.first()?;
        let last = self.children.last()?;
        Some(first.span.start - self.span.start..last.span.end - self.span.start)
    }

    /// Source between and around the children, in order, as
    /// `(relative range, text)` pairs. Empty gaps are skipped.
    pub fn gaps(&self) -> Vec<(Range<usize>, &'a str)> {
        let mut gaps = Vec::new();
        let mut cursor = self.span.start;
        for child in &self.children {
            if child.span.start > cursor {
                let rel = cursor - self.span.start..child.span.start - self.span.start;
                gaps.push((rel.clone(), &self.raw[rel]));
            }
            cursor = child.span.end;
        }
        if self.span.end > cursor {
            let rel = cursor - self.span.start..self.span.end - self.span.start;
            gaps.push((rel.clone(), &self.raw[rel]));
        }
        gaps
    }

    /// Depth-first iterator over this token and all of its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Token<'a>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let token = stack.pop()?;
            stack.extend(token.children.iter().rev());
            Some(token)
        })
    }
}
