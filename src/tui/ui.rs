use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{TitleBar, TranscriptView, input_box};

/// Draws one frame: title bar, transcript, input box.
pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, busy_frame: &str) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(input_box::HEIGHT)]);
    let [title_area, transcript_area, input_area] = layout.areas(frame.area());

    TitleBar::new(&app.model_name, &app.state).render(frame, title_area);

    let inner = TranscriptView::inner_area(transcript_area);
    let lines = tui
        .formatter
        .format(&app.conversation, inner.width, inner.height, busy_frame);
    TranscriptView::new(lines).render(frame, transcript_area);

    tui.input_box.render(frame, input_area);
}
