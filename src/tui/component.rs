use ratatui::Frame;
use ratatui::layout::Rect;

use super::event::TuiEvent;

/// A piece of the screen.
///
/// Data comes in as struct fields ("props"); `render` draws it into `area`.
/// `render` takes `&mut self` so stateful components (the input box) can
/// update scroll offsets while drawing.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that consumes `TuiEvent`s and reports what happened.
pub trait EventHandler {
    /// The higher-level event this component emits.
    type Event;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
