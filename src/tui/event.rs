use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    // Session commands (passed to core::update)
    Quit,
    Reset,
    Submit,

    // Editing (handled by the InputBox)
    InputChar(char),
    Paste(String),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,

    /// Viewport changed size; only forces a redraw.
    Resize,
}

/// Where a session's input events come from.
///
/// A local session reads the process terminal; a remote host would feed
/// events decoded from its own connection.
pub trait EventSource {
    /// Waits up to `timeout` for the next event. `Duration::ZERO` never blocks.
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<TuiEvent>>;
}

/// Reads events from the process terminal through crossterm.
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<TuiEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(translate(event::read()?))
    }
}

/// Maps a raw terminal event to a `TuiEvent`, dropping anything we don't handle.
pub fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) => translate_key(key),
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}

fn translate_key(key: KeyEvent) -> Option<TuiEvent> {
    // Release/repeat reports only arrive with keyboard enhancement enabled
    if key.kind != KeyEventKind::Press {
        return None;
    }
    log::debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);

    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => Some(TuiEvent::Reset),
        (KeyModifiers::CONTROL, KeyCode::Char('a')) => Some(TuiEvent::CursorHome),
        (KeyModifiers::CONTROL, KeyCode::Char('e')) => Some(TuiEvent::CursorEnd),
        (KeyModifiers::CONTROL, _) => None,
        (_, KeyCode::Esc) => Some(TuiEvent::Quit),
        (_, KeyCode::Enter) => Some(TuiEvent::Submit),
        (_, KeyCode::Char(c)) => Some(TuiEvent::InputChar(c)),
        (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
        (_, KeyCode::Delete) => Some(TuiEvent::Delete),
        (_, KeyCode::Left) => Some(TuiEvent::CursorLeft),
        (_, KeyCode::Right) => Some(TuiEvent::CursorRight),
        (_, KeyCode::Home) => Some(TuiEvent::CursorHome),
        (_, KeyCode::End) => Some(TuiEvent::CursorEnd),
        _ => None,
    }
}
