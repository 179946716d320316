//! The raw markdown source of the open document.
//!
//! [`RawDocument`] is rope-backed and addressed by UTF-8 byte offsets, the
//! same offsets the display surface uses. It is only changed through
//! [`RawDocument::replace`], which the editor calls once per accepted edit.

use std::ops::Range;

use ropey::Rope;

/// Direction for caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Result of a caret movement: the new offset and the column to aim for on
/// the next vertical move (sticky column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub offset: usize,
    pub goal_col: usize,
}

/// The markdown source, with revision and dirty tracking.
pub struct RawDocument {
    rope: Rope,
    revision: u64,
    dirty: bool,
}

impl Default for RawDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl RawDocument {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            revision: 0,
            dirty: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Bumped on every applied edit.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the document changed since load or the last successful save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its line ending.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Length of a line in bytes, without its line ending.
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    /// Replace the bytes in `range` with `text`.
    ///
    /// The range is clamped to the document and snapped to char
    /// boundaries. Returns the byte range the inserted text now occupies.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Range<usize> {
        let start = self.floor_boundary(range.start.min(self.len()));
        let end = self.floor_boundary(range.end.clamp(start, self.len()));
        if start == end && text.is_empty() {
            return start..start;
        }
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        self.rope.remove(start_char..end_char);
        self.rope.insert(start_char, text);
        self.revision += 1;
        self.dirty = true;
        start..start + text.len()
    }

    /// Zero-based line and byte column of `offset`.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = self.floor_boundary(offset.min(self.len()));
        let line = self.rope.byte_to_line(offset);
        (line, offset - self.rope.line_to_byte(line))
    }

    /// Byte offset of a line and column, clamped to the line's content.
    pub fn offset_of(&self, line: usize, col: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        let col = col.min(self.line_len(line));
        let line_start = self.rope.line_to_byte(line);
        self.floor_boundary(line_start + col)
    }

    /// Move the caret at `offset` one step. `goal_col` is the sticky column
    /// from a previous vertical move, if any.
    pub fn motion(&self, offset: usize, direction: Direction, goal_col: Option<usize>) -> Motion {
        let (line, col) = self.line_col(offset);
        match direction {
            Direction::Left => {
                let offset = self.prev_char(offset);
                Motion {
                    offset,
                    goal_col: self.line_col(offset).1,
                }
            }
            Direction::Right => {
                let offset = self.next_char(offset);
                Motion {
                    offset,
                    goal_col: self.line_col(offset).1,
                }
            }
            Direction::Up | Direction::Down => {
                let goal = goal_col.unwrap_or(col);
                let target = match direction {
                    Direction::Up if line > 0 => line - 1,
                    Direction::Down if line + 1 < self.line_count() => line + 1,
                    _ => return Motion { offset, goal_col: goal },
                };
                Motion {
                    offset: self.offset_of(target, goal),
                    goal_col: goal,
                }
            }
        }
    }

    pub fn line_start(&self, offset: usize) -> usize {
        let (line, _) = self.line_col(offset);
        self.rope.line_to_byte(line)
    }

    pub fn line_end(&self, offset: usize) -> usize {
        let (line, _) = self.line_col(offset);
        self.rope.line_to_byte(line) + self.line_len(line)
    }

    /// Start of the word before `offset`, crossing to the previous line end
    /// when already at a line start.
    pub fn word_left(&self, offset: usize) -> usize {
        let (line, col) = self.line_col(offset);
        if col == 0 {
            return if line > 0 {
                self.offset_of(line - 1, usize::MAX)
            } else {
                0
            };
        }
        let text = self.line_at(line).unwrap_or_default();
        let trimmed = text.get(..col).unwrap_or(&text).trim_end();
        let pos = trimmed
            .rfind(|c: char| !c.is_alphanumeric() && c != '_')
            .map_or(0, |i| i + 1);
        self.offset_of(line, pos)
    }

    /// Start of the next word after `offset`, crossing to the next line
    /// start when already at a line end.
    pub fn word_right(&self, offset: usize) -> usize {
        let (line, col) = self.line_col(offset);
        let text = self.line_at(line).unwrap_or_default();
        if col >= text.len() {
            return if line + 1 < self.line_count() {
                self.offset_of(line + 1, 0)
            } else {
                offset
            };
        }
        let after = text.get(col..).unwrap_or_default();
        let word_end = after
            .find(|c: char| !c.is_alphanumeric() && c != '_')
            .unwrap_or(after.len());
        let rest = &after[word_end..];
        let space_end = rest
            .find(|c: char| c.is_alphanumeric() || c == '_')
            .unwrap_or(rest.len());
        self.offset_of(line, col + word_end + space_end)
    }

    /// Byte offset of the char before `offset`.
    pub fn prev_char(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        if offset == 0 {
            return 0;
        }
        let idx = self.rope.byte_to_char(offset);
        self.rope.char_to_byte(idx.saturating_sub(1))
    }

    /// Byte offset of the char after `offset`.
    pub fn next_char(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        let idx = self.rope.byte_to_char(offset);
        self.rope.char_to_byte((idx + 1).min(self.rope.len_chars()))
    }

    fn floor_boundary(&self, offset: usize) -> usize {
        self.rope.char_to_byte(self.rope.byte_to_char(offset))
    }
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("revision", &self.revision)
            .field("dirty", &self.dirty)
            .finish()
    }
}
