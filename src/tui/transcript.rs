//! # Transcript Formatter
//!
//! Turns a conversation into pre-wrapped lines for a viewport of a given width.
//!
//! ```text
//!                                    ╭─────────────╮
//!                                    │ hello there │    user: right-aligned bubble,
//!                                    ╰─────────────╯          at most 3/4 of the width
//!
//!  Hi! How can I help you today? ⣽                    assistant: left, 1-col margin
//!
//! ```
//!
//! ## Layout Cache
//!
//! Laying out the transcript is keyed on `(width, content_version)`. While a
//! response streams, the spinner frame changes ten times a second but the
//! conversation does not, so the cached lines are reused and only the busy
//! trailing message is re-wrapped with the new frame. Everything above it is
//! laid out again only when the width or the conversation changes.

use std::borrow::Cow;

use log::debug;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use unicode_width::UnicodeWidthStr;

use crate::core::conversation::{Conversation, Message};

pub const WELCOME_TEXT: &str = "Welcome to termtalk!\nType a message and press Enter to send.";

/// Columns kept free on the right of user bubbles and left of assistant text.
const MARGIN: usize = 1;

/// Border plus one column of padding on each side of a bubble.
const BUBBLE_CHROME: usize = 4;

#[derive(Debug, Default)]
pub struct TranscriptFormatter {
    key: Option<(u16, u64)>,
    lines: Vec<Line<'static>>,
    /// Lines that do not depend on the spinner frame.
    stable_len: usize,
    /// Content of the trailing message while it shows the busy indicator.
    busy_tail: Option<String>,
    relayouts: u64,
}

impl TranscriptFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the transcript was laid out from scratch.
    pub fn relayouts(&self) -> u64 {
        self.relayouts
    }

    /// Returns the lines to display in a `width` x `height` viewport.
    ///
    /// `busy_frame` is appended to the trailing assistant message while it is
    /// still a placeholder or still streaming.
    pub fn format(
        &mut self,
        conversation: &Conversation,
        width: u16,
        height: u16,
        busy_frame: &str,
    ) -> &[Line<'static>] {
        if conversation.is_empty() {
            self.key = None;
            self.busy_tail = None;
            self.lines = welcome_lines(width, height);
            self.stable_len = self.lines.len();
            return &self.lines;
        }

        let key = (width, conversation.content_version());
        if self.key != Some(key) {
            self.relayout(conversation, width);
            self.key = Some(key);
        }

        self.lines.truncate(self.stable_len);
        if let Some(content) = &self.busy_tail {
            let shown = format!("{content} {busy_frame}");
            self.lines.extend(assistant_lines(&shown, width));
            self.lines.push(Line::default());
        }
        &self.lines
    }

    fn relayout(&mut self, conversation: &Conversation, width: u16) {
        self.relayouts += 1;
        debug!(
            "Transcript relayout #{} (width={}, version={})",
            self.relayouts,
            width,
            conversation.content_version()
        );

        let messages = conversation.transcript();
        let busy = messages.last().filter(|m| {
            !m.from_user && (m.is_placeholder || !conversation.last_response_complete)
        });
        let stable = match busy {
            Some(_) => &messages[..messages.len() - 1],
            None => messages,
        };

        self.lines.clear();
        for message in stable {
            self.lines.extend(message_lines(message, width));
            self.lines.push(Line::default());
        }
        self.stable_len = self.lines.len();
        self.busy_tail = busy.map(|m| m.content.clone());
    }
}

fn column_width(width: u16) -> usize {
    (usize::from(width) * 3 / 4).max(1)
}

fn message_lines(message: &Message, width: u16) -> Vec<Line<'static>> {
    if message.from_user {
        user_lines(&message.content, width)
    } else {
        assistant_lines(&message.content, width)
    }
}

/// Bordered bubble, right-aligned against the margin.
fn user_lines(content: &str, width: u16) -> Vec<Line<'static>> {
    let text_width = column_width(width).saturating_sub(BUBBLE_CHROME).max(1);
    let wrapped: Vec<Cow<'_, str>> = textwrap::wrap(content, text_width);
    let inner = wrapped.iter().map(|l| l.width()).max().unwrap_or(0);
    let indent = " ".repeat(
        usize::from(width)
            .saturating_sub(MARGIN)
            .saturating_sub(inner + BUBBLE_CHROME),
    );
    let style = Style::default().fg(Color::Cyan);
    let rule = "─".repeat(inner + 2);

    let mut lines = Vec::with_capacity(wrapped.len() + 2);
    lines.push(Line::styled(format!("{indent}╭{rule}╮"), style));
    for line in &wrapped {
        let pad = " ".repeat(inner - line.width());
        lines.push(Line::styled(format!("{indent}│ {pad}{line} │"), style));
    }
    lines.push(Line::styled(format!("{indent}╰{rule}╯"), style));
    lines
}

/// Plain wrapped text behind a one-column margin.
fn assistant_lines(content: &str, width: u16) -> Vec<Line<'static>> {
    let margin = " ".repeat(MARGIN);
    textwrap::wrap(content, column_width(width))
        .into_iter()
        .map(|line| Line::raw(format!("{margin}{line}")))
        .collect()
}

/// Welcome text centred in the viewport.
fn welcome_lines(width: u16, height: u16) -> Vec<Line<'static>> {
    let text: Vec<&str> = WELCOME_TEXT.lines().collect();
    let pad_lines = usize::from(height).saturating_sub(text.len()) / 2;
    let style = Style::default().fg(Color::DarkGray);

    let mut lines = vec![Line::default(); pad_lines];
    for line in text {
        let indent = usize::from(width).saturating_sub(line.width()) / 2;
        lines.push(Line::styled(format!("{}{line}", " ".repeat(indent)), style));
    }
    lines
}
