//! # InputBox Component
//!
//! Single-line prompt at the bottom of the screen.
//!
//! ```text
//! ╭──────────────────────────────────────╮
//! │> Send a message...                   │
//! ╰──────────────────────────────────────╯
//! ```
//!
//! Long input scrolls horizontally to keep the cursor visible. Pasted text
//! has its line breaks flattened to spaces.
//!
//! Enter emits `InputEvent::Submit` with the current text but does not clear
//! the buffer: the session may refuse the submission (a request is still
//! streaming), in which case the text must stay put. The event loop calls
//! `clear()` once the session accepts it.

mod cursor;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::{CursorState, next_char_boundary, prev_char_boundary, visible_slice};

const PROMPT: &str = "> ";
const PLACEHOLDER: &str = "Send a message...";

/// Rows taken by the box, borders included.
pub const HEIGHT: u16 = 3;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed with this text.
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    buffer: String,
    cursor: CursorState,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: CursorState::new(),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor.reset();
    }

    /// Takes the unsent text, leaving the box empty.
    pub fn take(&mut self) -> String {
        self.cursor.reset();
        std::mem::take(&mut self.buffer)
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor.pos, text);
        self.cursor.pos += text.len();
    }
}

/// Single-line input: any line break becomes a space.
fn flatten(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().border_type(BorderType::Rounded);
        let inner = block.inner(area);
        let visible = usize::from(inner.width).saturating_sub(PROMPT.len());
        self.cursor.update_scroll(&self.buffer, visible);

        let prompt = Span::styled(PROMPT, Style::default().fg(Color::Cyan));
        let line = if self.buffer.is_empty() {
            Line::from(vec![
                prompt,
                Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(vec![
                prompt,
                Span::raw(visible_slice(&self.buffer, self.cursor.scroll, visible)),
            ])
        };
        frame.render_widget(Paragraph::new(line).block(block), area);

        let offset = self.cursor.column(&self.buffer) - self.cursor.scroll;
        let x = inner.x + (PROMPT.len() + offset) as u16;
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let c = if matches!(c, '\n' | '\r') { ' ' } else { *c };
                self.insert(c.encode_utf8(&mut [0; 4]));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.insert(&flatten(text));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.cursor.pos > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor.pos < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => (self.cursor.pos > 0).then(|| {
                self.cursor.pos = prev_char_boundary(&self.buffer, self.cursor.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.cursor.pos < self.buffer.len()).then(|| {
                self.cursor.pos = next_char_boundary(&self.buffer, self.cursor.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => (self.cursor.pos != 0).then(|| {
                self.cursor.pos = 0;
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorEnd => (self.cursor.pos != self.buffer.len()).then(|| {
                self.cursor.pos = self.buffer.len();
                InputEvent::ContentChanged
            }),
            TuiEvent::Submit => Some(InputEvent::Submit(self.buffer.clone())),
            _ => None,
        }
    }
}
