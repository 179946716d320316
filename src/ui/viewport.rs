//! Which rows of the laid-out document are on screen.

use std::ops::Range;

/// The visible window over the document's display rows.
///
/// ```
/// use synapse::ui::viewport::Viewport;
///
/// let mut vp = Viewport::new(80, 10, 100);
/// vp.reveal(42);
/// assert_eq!(vp.visible_range(), 33..43);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    total_lines: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(80, 24, 0)
    }
}

impl Viewport {
    /// `height` counts document rows only, not the status bar.
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            total_lines,
        }
    }

    /// First visible row.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height as usize).min(self.total_lines);
        self.offset.min(end)..end
    }

    /// How far down the document the window is, 0-100.
    pub fn scroll_percent(&self) -> u8 {
        let max_offset = self.max_offset();
        if max_offset == 0 {
            return 100;
        }
        let percent = self.offset.min(max_offset) * 100 / max_offset;
        u8::try_from(percent).unwrap_or(100)
    }

    pub const fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.max_offset());
    }

    pub const fn page_up(&mut self) {
        self.scroll_up(self.height as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height as usize);
    }

    pub const fn go_to_top(&mut self) {
        self.offset = 0;
    }

    pub const fn go_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    /// Scroll the least amount that puts `row` on screen.
    pub const fn reveal(&mut self, row: usize) {
        if self.height == 0 {
            self.offset = row;
        } else if row < self.offset {
            self.offset = row;
        } else if row >= self.offset + self.height as usize {
            self.offset = row + 1 - self.height as usize;
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Update the row count after the layout changed.
    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.offset = self.offset.min(self.max_offset());
    }

    const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }
}
