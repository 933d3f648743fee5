//! # Actions
//!
//! Everything that can happen in a session becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The model streams a chunk? That's `Action::Driver { id, event }`.
//!
//! `update()` applies an action to the session state and returns an `Effect`
//! telling the event loop what I/O to perform. No I/O happens here.
//!
//! ```text
//!  Idle | Error ──Submit──▶ AwaitingFirstChunk ──Partial──▶ Streaming ──Partial──┐
//!                                 │                            │  ▲──────────────┘
//!                                 ├──────── Complete ──────────┤──▶ Idle
//!                                 └──────── Failed ────────────┴──▶ Error
//!
//!  any state ──Reset or "/clear"──▶ Idle
//! ```
//!
//! Driver events carry the id of the request that produced them. Only events
//! for `App::active_request` are applied; anything else belongs to a request
//! that was orphaned by a reset and is dropped.

use log::{debug, info, warn};

use crate::core::conversation::THINKING_LABEL;
use crate::core::state::{App, SessionState};
use crate::inference::{DriverEvent, RequestId};

/// Submitting exactly this (after trimming) resets the conversation.
pub const CLEAR_COMMAND: &str = "/clear";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The user pressed Enter on `text`.
    Submit(String),
    /// Forget the conversation.
    Reset,
    Quit,
    /// Output of a streaming request.
    Driver { id: RequestId, event: DriverEvent },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Applied; nothing else to do.
    None,
    /// Start the driver for this request with the current model context.
    SpawnRequest(RequestId),
    /// The action was refused; the user's input stays where it is.
    Ignored,
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => submit(app, text),
        Action::Reset => {
            reset(app);
            Effect::None
        }
        Action::Quit => Effect::Quit,
        Action::Driver { id, event } => {
            apply_driver_event(app, id, event);
            Effect::None
        }
    }
}

fn submit(app: &mut App, text: String) -> Effect {
    if text.trim() == CLEAR_COMMAND {
        reset(app);
        return Effect::None;
    }

    if app.conversation.awaiting_response {
        debug!("Submit ignored: request {:?} still outstanding", app.active_request);
        return Effect::Ignored;
    }

    if let Err(e) = app.conversation.append_user(&text) {
        debug!("Submit ignored: {}", e);
        return Effect::Ignored;
    }
    app.conversation.append_placeholder(THINKING_LABEL);
    app.conversation.awaiting_response = true;
    app.state = SessionState::AwaitingFirstChunk;

    let id = app.begin_request();
    info!("Submitted message ({} chars) as request {}", text.len(), id);
    Effect::SpawnRequest(id)
}

fn reset(app: &mut App) {
    if let Some(id) = app.active_request.take() {
        info!("Reset while request {} outstanding; its events will be dropped", id);
    } else {
        info!("Conversation reset");
    }
    app.conversation.clear();
    app.state = SessionState::Idle;
}

fn apply_driver_event(app: &mut App, id: RequestId, event: DriverEvent) {
    if app.active_request != Some(id) {
        debug!("Dropping event from stale request {}: {:?}", id, event);
        return;
    }

    if event.is_terminal() {
        app.active_request = None;
    }
    match event {
        DriverEvent::Partial(text) => {
            app.conversation.apply_chunk(&text);
            app.state = SessionState::Streaming;
        }
        DriverEvent::Complete(text) => {
            info!("Request {} complete ({} bytes)", id, text.len());
            app.conversation.finalize(&text);
            app.state = SessionState::Idle;
        }
        DriverEvent::Failed(err) => {
            warn!("Request {} failed [{}]: {}", id, err.label(), err);
            app.conversation.abort_response();
            app.state = SessionState::Error(err);
        }
    }
}
