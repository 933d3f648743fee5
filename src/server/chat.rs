use std::io;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::stream;
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, timeout_at};

use crate::core::Conversation;
use crate::core::error::ChatError;
use crate::inference::{ContextEntry, DriverEvent, spawn_driver};
use crate::server::ServerState;
use crate::server::error::ApiError;

/// One entry of a request body. Roles other than `user` and `assistant` are
/// skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

/// Builds the one-shot conversation for a call, seeded with the configured
/// system prompt.
fn build_conversation(
    system_prompt: &str,
    messages: Vec<IncomingMessage>,
) -> Result<Conversation, ApiError> {
    let history = messages
        .into_iter()
        .filter_map(|msg| match msg.role.as_str() {
            "user" => Some(ContextEntry::user(msg.content)),
            "assistant" => Some(ContextEntry::assistant(msg.content)),
            other => {
                warn!("Skipping message with role '{}'", other);
                None
            }
        });

    let mut conversation = Conversation::new(system_prompt);
    conversation.restore(history);
    if conversation.is_empty() {
        return Err(ApiError::BadRequest(
            "no user or assistant messages".to_string(),
        ));
    }
    Ok(conversation)
}

/// `POST /api/chat`
///
/// Errors before the first piece of text become a JSON error response. Once
/// the body has started, a failure or the deadline ends it early.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let messages: Vec<IncomingMessage> =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    info!("POST /api/chat ({} messages)", messages.len());

    let conversation = build_conversation(&state.system_prompt, messages)?;
    let deadline = Instant::now() + state.request_timeout;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let driver = spawn_driver(
        state.provider.clone(),
        conversation.model_context().to_vec(),
        state.model_name.clone(),
        move |event| tx.send(event).is_ok(),
    );
    let driver = AbortOnDrop(driver.abort_handle());

    let first = match timeout_at(deadline, rx.recv()).await {
        Ok(Some(DriverEvent::Failed(err))) => {
            warn!("Chat request failed before any text: {}", err);
            return Err(err.into());
        }
        Ok(Some(event)) => event,
        Ok(None) => {
            return Err(ApiError::BadGateway(
                "stream ended without a result".to_string(),
            ));
        }
        Err(_) => {
            warn!("Chat request timed out before any text");
            return Err(ChatError::Timeout.into());
        }
    };

    let relay = Relay {
        pending: Some(first),
        rx,
        sent: 0,
        deadline,
        finished: false,
        _driver: driver,
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream::unfold(relay, next_chunk)),
    )
        .into_response())
}

/// `GET /teapot`
pub async fn teapot() -> (StatusCode, &'static str) {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot")
}

/// Stops the driver when the response body is dropped, e.g. on disconnect.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Turns driver events into body writes of the not-yet-sent suffix.
struct Relay {
    pending: Option<DriverEvent>,
    rx: mpsc::UnboundedReceiver<DriverEvent>,
    /// Bytes of the accumulated text already written.
    sent: usize,
    deadline: Instant,
    finished: bool,
    _driver: AbortOnDrop,
}

impl Relay {
    fn suffix(&mut self, text: &str) -> Option<Bytes> {
        let suffix = text.get(self.sent..).filter(|s| !s.is_empty())?;
        self.sent = text.len();
        Some(Bytes::copy_from_slice(suffix.as_bytes()))
    }

    fn fail(mut self, err: io::Error) -> Option<(io::Result<Bytes>, Relay)> {
        self.finished = true;
        Some((Err(err), self))
    }
}

async fn next_chunk(mut relay: Relay) -> Option<(io::Result<Bytes>, Relay)> {
    loop {
        if relay.finished {
            return None;
        }

        let event = match relay.pending.take() {
            Some(event) => event,
            None => {
                let received = timeout_at(relay.deadline, relay.rx.recv()).await;
                match received {
                    Ok(Some(event)) => event,
                    Ok(None) => {
                        return relay.fail(io::Error::other("stream ended without a result"));
                    }
                    Err(_) => {
                        warn!("Chat response cut off at {} bytes: timed out", relay.sent);
                        return relay
                            .fail(io::Error::new(io::ErrorKind::TimedOut, ChatError::Timeout));
                    }
                }
            }
        };

        match event {
            DriverEvent::Partial(text) => {
                if let Some(bytes) = relay.suffix(&text) {
                    return Some((Ok(bytes), relay));
                }
            }
            DriverEvent::Complete(text) => {
                relay.finished = true;
                let tail = relay.suffix(&text);
                info!("Chat response complete ({} bytes)", relay.sent);
                return tail.map(|bytes| (Ok(bytes), relay));
            }
            DriverEvent::Failed(err) => {
                warn!("Chat response cut off at {} bytes: {}", relay.sent, err);
                return relay.fail(io::Error::other(err));
            }
        }
        debug!("Skipping empty partial");
    }
}
