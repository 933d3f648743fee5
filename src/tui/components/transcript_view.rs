//! # TranscriptView Component
//!
//! Draws the formatter's lines inside a rounded border, pinned to the bottom.
//! Lines arrive already wrapped to the inner width, so only the last
//! `inner height` of them are handed to ratatui.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::Component;

pub struct TranscriptView<'a> {
    pub lines: &'a [Line<'static>],
}

impl<'a> TranscriptView<'a> {
    pub fn new(lines: &'a [Line<'static>]) -> Self {
        Self { lines }
    }

    /// The area the formatter should lay out for.
    pub fn inner_area(area: Rect) -> Rect {
        Self::block().inner(area)
    }

    fn block() -> Block<'static> {
        Block::bordered().border_type(BorderType::Rounded)
    }
}

impl Component for TranscriptView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let visible = usize::from(Self::inner_area(area).height);
        let start = self.lines.len().saturating_sub(visible);

        let paragraph = Paragraph::new(self.lines[start..].to_vec()).block(Self::block());
        frame.render_widget(paragraph, area);
    }
}
