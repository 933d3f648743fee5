//! Cursor position and horizontal scrolling for the InputBox.
//!
//! `CursorState` owns the cursor byte offset and the scroll offset (in display
//! columns). Methods take `buffer: &str` explicitly; the text is owned by
//! `InputBox`.

use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

pub(super) struct CursorState {
    /// Byte offset in the buffer (0..=buffer.len()), always on a char boundary.
    pub pos: usize,
    /// Display columns hidden on the left.
    pub scroll: usize,
}

impl CursorState {
    pub fn new() -> Self {
        Self { pos: 0, scroll: 0 }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
        self.scroll = 0;
    }

    /// Display column of the cursor, counted from the start of the buffer.
    pub fn column(&self, buffer: &str) -> usize {
        buffer[..self.pos].width()
    }

    /// Scrolls just enough to keep the cursor inside `visible` columns.
    pub fn update_scroll(&mut self, buffer: &str, visible: usize) {
        let column = self.column(buffer);
        if visible == 0 {
            self.scroll = column;
        } else if column < self.scroll {
            self.scroll = column;
        } else if column >= self.scroll + visible {
            self.scroll = column + 1 - visible;
        }
    }
}

pub(super) fn prev_char_boundary(s: &str, pos: usize) -> usize {
    s[..pos].char_indices().next_back().map_or(0, |(i, _)| i)
}

pub(super) fn next_char_boundary(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map_or(pos, |c| pos + c.len_utf8())
}

/// The part of `buffer` that fits in `visible` columns after skipping `scroll` columns.
///
/// A wide character straddling the left edge is dropped entirely.
pub(super) fn visible_slice(buffer: &str, scroll: usize, visible: usize) -> &str {
    let mut column = 0;
    let mut start = buffer.len();
    let mut end = buffer.len();

    for (i, c) in buffer.char_indices() {
        let w = c.width().unwrap_or(0);
        if start == buffer.len() && column >= scroll {
            start = i;
        }
        if start != buffer.len() && column + w > scroll + visible {
            end = i;
            break;
        }
        column += w;
    }

    if start > end { "" } else { &buffer[start..end] }
}
