//! Lay the display tree out as terminal rows.
//!
//! Text leaves are cut at newlines into styled segments. Markup leaves in
//! Rendered form are hidden, except that their newlines still break rows,
//! indentation at the start of a row is kept, and list, quote, table and
//! rule syntax is drawn as decoration. Every segment remembers the source
//! range it came from so caret offsets and screen cells map both ways.

use std::ops::Range;

use ratatui::style::{Color, Modifier, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::perf::Stage;
use crate::surface::{DisplayTree, NodeData, NodeId, Tag};

/// Width of the line drawn for a thematic break.
const RULE_WIDTH: usize = 24;

/// A run of cells drawn from one text leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
    /// Byte range of the source this segment stands for.
    pub source: Range<usize>,
    /// `text` is the source itself rather than a decoration of it.
    pub verbatim: bool,
}

impl Segment {
    fn width(&self) -> usize {
        self.text.width()
    }
}

/// One terminal row. `start..=end` are the caret offsets that land on it;
/// `end` is the offset of the row's newline, or the document length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub start: usize,
    pub end: usize,
    pub segments: Vec<Segment>,
}

impl Row {
    pub fn width(&self) -> usize {
        self.segments.iter().map(Segment::width).sum()
    }

    /// Displayed text, without styles.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn column_of(&self, offset: usize) -> usize {
        let mut col = 0;
        for segment in &self.segments {
            if offset < segment.source.start {
                break;
            }
            if offset < segment.source.end {
                if segment.verbatim {
                    let within = offset - segment.source.start;
                    col += segment.text.get(..within).map_or(0, UnicodeWidthStr::width);
                }
                return col;
            }
            col += segment.width();
        }
        col
    }

    fn offset_at(&self, column: usize) -> usize {
        let mut col = 0;
        for segment in &self.segments {
            let width = segment.width();
            if column < col + width {
                if !segment.verbatim {
                    return segment.source.start;
                }
                let mut at = col;
                for (i, c) in segment.text.char_indices() {
                    at += c.width().unwrap_or(0);
                    if column < at {
                        return segment.source.start + i;
                    }
                }
                return segment.source.end;
            }
            col += width;
        }
        self.end
    }
}

/// The whole document as rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentLayout {
    pub rows: Vec<Row>,
}

impl DocumentLayout {
    /// Lay out every text leaf of `tree`.
    pub fn build(tree: &DisplayTree) -> Self {
        let _scope = crate::perf::scope(Stage::Layout);
        let mut rows = Vec::new();
        let mut row = Row::default();
        let mut offset = 0;
        for id in tree.text_nodes(tree.root()) {
            let Some(leaf) = tree.text(id) else {
                continue;
            };
            let hidden = leaf.markup && !tree.markup_visible(id);
            let style = leaf_style(tree, id, leaf.markup);
            let decoration = tree
                .owner(id)
                .and_then(|owner| tree.element(owner))
                .map(|e| e.tag.clone());
            for (i, piece) in leaf.content.split('\n').enumerate() {
                if i > 0 {
                    row.end = offset;
                    offset += 1;
                    rows.push(std::mem::replace(
                        &mut row,
                        Row {
                            start: offset,
                            end: offset,
                            segments: Vec::new(),
                        },
                    ));
                }
                if piece.is_empty() {
                    continue;
                }
                let source = offset..offset + piece.len();
                offset = source.end;
                let segment = if hidden {
                    let at_row_start = row.width() == 0;
                    Segment {
                        text: decorate(decoration.as_ref(), piece, at_row_start),
                        style: decoration_style(),
                        source,
                        verbatim: false,
                    }
                } else {
                    Segment {
                        text: piece.to_string(),
                        style,
                        source,
                        verbatim: true,
                    }
                };
                row.segments.push(segment);
            }
        }
        row.end = offset;
        rows.push(row);
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Screen position (row, column) of a caret offset.
    pub fn caret_position(&self, offset: usize) -> (usize, usize) {
        let index = self
            .rows
            .partition_point(|row| row.end < offset)
            .min(self.rows.len().saturating_sub(1));
        let col = self.rows.get(index).map_or(0, |row| row.column_of(offset));
        (index, col)
    }

    /// Caret offset for a screen cell, clamped to the document.
    pub fn offset_at(&self, row: usize, column: usize) -> usize {
        match self.rows.get(row) {
            Some(row) => row.offset_at(column),
            None => self.rows.last().map_or(0, |row| row.end),
        }
    }
}

/// Replacement text for hidden markup.
fn decorate(tag: Option<&Tag>, piece: &str, at_row_start: bool) -> String {
    let indent = if at_row_start {
        &piece[..piece.len() - piece.trim_start().len()]
    } else {
        ""
    };
    let body = &piece[indent.len()..];
    let shown = match tag {
        Some(Tag::List { .. } | Tag::ListItem { .. }) => list_marker(body),
        Some(Tag::BlockQuote) => body.replace('>', "│"),
        Some(Tag::Table | Tag::TableRow { .. }) => body
            .chars()
            .map(|c| match c {
                '|' => '│',
                '-' | ':' => '─',
                c => c,
            })
            .collect(),
        Some(Tag::Rule) => "─".repeat(RULE_WIDTH),
        _ if matches!(body.trim(), "[ ]" | "[x]" | "[X]") => list_marker(body),
        _ => String::new(),
    };
    format!("{indent}{shown}")
}

/// Bullets become `•`; task boxes become `☐` / `☑`; ordinals stay.
fn list_marker(body: &str) -> String {
    body.replace("[ ]", "☐")
        .replace("[x]", "☑")
        .replace("[X]", "☑")
        .split(' ')
        .map(|word| match word {
            "-" | "*" | "+" => "•",
            word => word,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn decoration_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Style of a leaf from the tags of its enclosing elements.
fn leaf_style(tree: &DisplayTree, id: NodeId, markup: bool) -> Style {
    let mut chain: Vec<NodeId> = tree.ancestors(id).collect();
    chain.reverse();
    let mut style = chain
        .into_iter()
        .filter_map(|n| match tree.data(n) {
            Some(NodeData::Element(element)) => Some(&element.tag),
            _ => None,
        })
        .fold(Style::default(), tag_style);
    if markup {
        style = style.fg(Color::DarkGray).remove_modifier(Modifier::UNDERLINED);
    }
    style
}

fn tag_style(base: Style, tag: &Tag) -> Style {
    match tag {
        Tag::Heading(1) => base
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        Tag::Heading(2) => base.fg(Color::Green).add_modifier(Modifier::BOLD),
        Tag::Heading(3) => base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
        Tag::Heading(4) => base.fg(Color::Blue).add_modifier(Modifier::BOLD),
        Tag::Heading(5) => base.fg(Color::Magenta).add_modifier(Modifier::BOLD),
        Tag::Heading(_) => base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Tag::CodeBlock { .. } => base.fg(Color::Indexed(245)),
        Tag::CodeSpan => base.fg(Color::Yellow),
        Tag::BlockQuote => base.fg(Color::Blue).add_modifier(Modifier::ITALIC),
        Tag::Emphasis => base.add_modifier(Modifier::ITALIC),
        Tag::Strong => base.add_modifier(Modifier::BOLD),
        Tag::Strikethrough => base.add_modifier(Modifier::CROSSED_OUT),
        Tag::Link { .. } => base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        Tag::Image { .. } => base.fg(Color::Magenta).add_modifier(Modifier::ITALIC),
        Tag::TableRow { header: true } => base.add_modifier(Modifier::BOLD),
        Tag::Rule => base.fg(Color::Indexed(240)),
        Tag::Html { .. } => base.fg(Color::Indexed(245)),
        Tag::Root
        | Tag::Paragraph
        | Tag::List { .. }
        | Tag::ListItem { .. }
        | Tag::Table
        | Tag::TableRow { header: false }
        | Tag::TableCell
        | Tag::LineBreak => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Editor;

    fn layout(text: &str) -> DocumentLayout {
        let editor = Editor::open(text).unwrap();
        DocumentLayout::build(editor.surface().tree())
    }

    fn row_texts(layout: &DocumentLayout) -> Vec<String> {
        layout.rows.iter().map(Row::text).collect()
    }

    #[test]
    fn test_rendered_form_hides_inline_markup() {
        let layout = layout("# Title\n\nSome **bold** text\n");
        assert_eq!(row_texts(&layout), vec!["Title", "", "Some bold text", ""]);
    }

    #[test]
    fn test_source_form_shows_markup() {
        let mut editor = Editor::open("Some **bold** text\n").unwrap();
        editor.set_caret(8);
        let layout = DocumentLayout::build(editor.surface().tree());
        assert_eq!(layout.rows[0].text(), "Some **bold** text");
    }

    #[test]
    fn test_caret_inside_code_span_shows_backticks() {
        let mut editor = Editor::open("use `let x` here\n").unwrap();
        let layout = DocumentLayout::build(editor.surface().tree());
        assert_eq!(layout.rows[0].text(), "use let x here");

        editor.set_caret(7);
        let layout = DocumentLayout::build(editor.surface().tree());
        assert_eq!(layout.rows[0].text(), "use `let x` here");
    }

    #[test]
    fn test_autolinks_keep_their_text() {
        let rows = row_texts(&layout("see http://example.com now\n"));
        assert_eq!(rows[0], "see http://example.com now");

        let rows = row_texts(&layout("see <http://example.com> now\n"));
        assert_eq!(rows[0], "see http://example.com now");

        let mut editor = Editor::open("see <http://example.com> now\n").unwrap();
        editor.set_caret(10);
        let layout = DocumentLayout::build(editor.surface().tree());
        assert_eq!(layout.rows[0].text(), "see <http://example.com> now");
    }

    #[test]
    fn test_list_and_quote_decorations() {
        let layout = layout("- one\n- two\n\n> quoted\n");
        let rows = row_texts(&layout);
        assert_eq!(rows[0], "• one");
        assert_eq!(rows[1], "• two");
        assert_eq!(rows[3], "│ quoted");
    }

    #[test]
    fn test_list_markers() {
        let item = Tag::ListItem {
            task: true,
            checked: true,
        };
        assert_eq!(decorate(Some(&item), "  - [x] ", true), "  • ☑ ");
        assert_eq!(decorate(Some(&item), "[ ] ", false), "☐ ");
        assert_eq!(decorate(Some(&item), "3. ", true), "3. ");
        assert_eq!(decorate(Some(&Tag::Paragraph), "[x] ", false), "☑ ");
        assert_eq!(decorate(Some(&Tag::Strong), "**", false), "");
    }

    #[test]
    fn test_table_markup_becomes_box_lines() {
        let row = Tag::TableRow { header: false };
        assert_eq!(decorate(Some(&row), "| ", true), "│ ");
        assert_eq!(decorate(Some(&Tag::Table), "|---|:-:|", true), "│───│───│");
    }

    #[test]
    fn test_rule_is_drawn() {
        let layout = layout("a\n\n---\n\nb\n");
        assert_eq!(layout.rows[2].text(), "─".repeat(RULE_WIDTH));
    }

    #[test]
    fn test_rows_cover_every_offset() {
        let text = "# Head\n\n*em* and `code`\n";
        let layout = layout(text);
        assert_eq!(layout.rows.first().map(|r| r.start), Some(0));
        assert_eq!(layout.rows.last().map(|r| r.end), Some(text.len()));
        for pair in layout.rows.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    #[test]
    fn test_caret_maps_past_hidden_markup() {
        // With "**" hidden, the caret after 'b' sits at column 6.
        let layout = layout("Some **bold** text\n");
        assert_eq!(layout.caret_position(8), (0, 6));
        assert_eq!(layout.caret_position(0), (0, 0));
        assert_eq!(layout.caret_position(19), (1, 0));
    }

    #[test]
    fn test_offset_at_inverts_caret_position() {
        let layout = layout("plain line\nsecond line\n");
        assert_eq!(layout.offset_at(1, 3), 14);
        assert_eq!(layout.caret_position(14), (1, 3));
        assert_eq!(layout.offset_at(0, 99), 10);
        assert_eq!(layout.offset_at(9, 0), 23);
    }

    #[test]
    fn test_wide_characters_take_two_columns() {
        let layout = layout("日本語\n");
        assert_eq!(layout.caret_position(6), (0, 4));
    }
}
