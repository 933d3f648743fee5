//! # TUI Adapter
//!
//! The ratatui-specific layer. Renders the session, translates keys into
//! `core::Action` values and runs streaming requests off the loop.
//!
//! ```text
//!   EventSource ──TuiEvent──▶ ┌────────────────────┐ ──draw──▶ Terminal<B>
//!                             │   session loop     │
//!   driver task ──Action────▶ │  update(app, ..)   │
//!   (mpsc, per request id)    └────────────────────┘
//! ```
//!
//! All session state is touched on the loop thread only. Driver tasks send
//! `Action::Driver` back through a std mpsc channel; the loop drains it
//! between input polls, in arrival order.
//!
//! `run_session` is generic over the ratatui backend and the event source, so
//! the same loop serves the local terminal and `TestBackend` in tests.
//!
//! ## Redraw Strategy
//!
//! - **Busy** (awaiting or streaming): draws every spinner tick (~100ms).
//! - **Idle**: sleeps up to 500ms and only redraws on events or driver output.

mod component;
mod components;
mod event;
pub mod spinner;
pub mod transcript;
mod ui;

use std::io::{self, stdout};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::Backend;
use tokio::task::AbortHandle;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::inference::{CompletionProvider, OpenAiProvider, RequestId, spawn_driver};
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent};
use crate::tui::transcript::TranscriptFormatter;

pub use event::{CrosstermEvents, EventSource, TuiEvent};

const IDLE_POLL: Duration = Duration::from_millis(500);

/// TUI-specific presentation state (not part of core session logic)
pub struct TuiState {
    pub input_box: InputBox,
    pub formatter: TranscriptFormatter,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            input_box: InputBox::new(),
            formatter: TranscriptFormatter::new(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> io::Result<Self> {
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock, // blinking resets on every draw()
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableBracketedPaste, SetCursorStyle::DefaultUserShape);
    }
}

pub fn build_provider(config: &ResolvedConfig) -> Arc<dyn CompletionProvider> {
    Arc::new(OpenAiProvider::new(
        config.api_key.clone(),
        config.base_url.clone(),
    ))
}

/// Runs a local session on the process terminal until the user quits.
///
/// Any unsent draft is printed once the terminal is restored.
pub fn run(config: ResolvedConfig) -> io::Result<()> {
    let app = App::new(
        build_provider(&config),
        config.model_name.clone(),
        &config.system_prompt,
    );

    let mut terminal = ratatui::init();
    let guard = TerminalModeGuard::new();
    if let Err(e) = &guard {
        warn!("Failed to enable terminal modes: {}", e);
    }

    let result = run_session(&mut terminal, &mut CrosstermEvents, app);

    drop(guard);
    ratatui::restore();

    let draft = result?;
    if !draft.is_empty() {
        println!("{draft}");
    }
    Ok(())
}

/// Drives one session until a quit event, then tears it down.
///
/// Returns the text left in the input box.
pub fn run_session<B, E>(
    terminal: &mut Terminal<B>,
    events: &mut E,
    mut app: App,
) -> io::Result<String>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
    E: EventSource,
{
    let mut tui = TuiState::new();
    let (tx, rx) = mpsc::channel::<Action>();
    let mut in_flight: Vec<AbortHandle> = Vec::new();

    let start = Instant::now();
    let mut needs_redraw = true;

    info!("Session started (model={})", app.model_name);

    'session: loop {
        let busy = app.state.is_busy();
        if busy || needs_redraw {
            let busy_frame = spinner::frame_at(start.elapsed());
            terminal
                .draw(|f| ui::draw_ui(f, &app, &mut tui, busy_frame))
                .map_err(io::Error::other)?;
            needs_redraw = false;
        }

        let timeout = if busy { spinner::TICK } else { IDLE_POLL };
        let mut next = events.next_event(timeout)?;
        while let Some(event) = next {
            needs_redraw = true;
            if handle_event(event, &mut app, &mut tui, &tx, &mut in_flight) == Effect::Quit {
                break 'session;
            }
            next = events.next_event(Duration::ZERO)?;
        }

        // Driver output, in the order the tasks sent it
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            update(&mut app, action);
        }
        in_flight.retain(|handle| !handle.is_finished());
    }

    for handle in in_flight {
        handle.abort();
    }
    info!("Session ended");
    Ok(tui.input_box.take())
}

fn handle_event(
    event: TuiEvent,
    app: &mut App,
    tui: &mut TuiState,
    tx: &mpsc::Sender<Action>,
    in_flight: &mut Vec<AbortHandle>,
) -> Effect {
    let action = match event {
        TuiEvent::Resize => return Effect::None,
        TuiEvent::Quit => Action::Quit,
        TuiEvent::Reset => Action::Reset,
        other => match tui.input_box.handle_event(&other) {
            Some(InputEvent::Submit(text)) => Action::Submit(text),
            _ => return Effect::None,
        },
    };

    let submitted = matches!(action, Action::Submit(_));
    let effect = update(app, action);
    match &effect {
        Effect::SpawnRequest(id) => {
            tui.input_box.clear();
            in_flight.push(spawn_request(app, *id, tx.clone()));
        }
        Effect::None if submitted => tui.input_box.clear(),
        Effect::Ignored => debug!(
            "Submission refused; keeping input ({} bytes)",
            tui.input_box.buffer().len()
        ),
        _ => {}
    }
    effect
}

fn spawn_request(app: &App, id: RequestId, tx: mpsc::Sender<Action>) -> AbortHandle {
    let handle = spawn_driver(
        app.provider.clone(),
        app.conversation.model_context().to_vec(),
        app.model_name.clone(),
        move |event| {
            let delivered = tx.send(Action::Driver { id, event }).is_ok();
            if !delivered {
                warn!("Session gone; dropping events for request {}", id);
            }
            delivered
        },
    );
    handle.abort_handle()
}
