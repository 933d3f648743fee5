//! # TitleBar Component
//!
//! One-line status bar: `termtalk (model: gpt-4o-mini) | Streaming`.
//!
//! Stateless. Both props come from core `App` state and are handed over by
//! `ui::draw_ui` on every frame. An error status is drawn in red so it stands
//! out from the normal states.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::core::state::SessionState;
use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub model_name: &'a str,
    pub state: &'a SessionState,
}

impl<'a> TitleBar<'a> {
    pub fn new(model_name: &'a str, state: &'a SessionState) -> Self {
        Self { model_name, state }
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let status_style = match self.state {
            SessionState::Error(_) => Style::default().fg(Color::Red),
            SessionState::Idle => Style::default(),
            _ => Style::default().fg(Color::Yellow),
        };

        let line = Line::from(vec![
            Span::raw(format!("termtalk (model: {}) | ", self.model_name)),
            Span::styled(self.state.to_string(), status_style),
        ]);
        frame.render_widget(line, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ChatError;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(state: &SessionState) -> (String, ratatui::buffer::Buffer) {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut title_bar = TitleBar::new("gpt-4o-mini", state);

        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text = buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        (text, buffer)
    }

    #[test]
    fn test_title_bar_shows_model_and_state() {
        let (text, _) = rendered(&SessionState::Idle);
        assert!(text.starts_with("termtalk (model: gpt-4o-mini) | Idle"));

        let (text, _) = rendered(&SessionState::AwaitingFirstChunk);
        assert!(text.contains("| Thinking"));

        let (text, _) = rendered(&SessionState::Streaming);
        assert!(text.contains("| Streaming"));
    }

    #[test]
    fn test_title_bar_error_is_red() {
        let state = SessionState::Error(ChatError::TransportFailure("refused".into()));
        let (text, buffer) = rendered(&state);

        assert!(text.contains("Error: transport failure: refused"));
        let status_x = text.find("Error").unwrap() as u16;
        assert_eq!(buffer[(status_x, 0)].fg, Color::Red);
    }
}
