//! # Session State
//!
//! Everything one chat session owns. Presentation state (input box, spinner,
//! layout cache) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── provider: Arc<dyn CompletionProvider>  // shared, immutable
//! ├── model_name: String
//! ├── conversation: Conversation            // transcript + model context
//! ├── state: SessionState                   // Idle / AwaitingFirstChunk / Streaming / Error
//! ├── active_request: Option<RequestId>     // the only id whose events are applied
//! └── next_request: RequestId
//! ```
//!
//! State changes only happen through `update(app, action)` in action.rs.

use std::fmt;
use std::sync::Arc;

use crate::core::conversation::Conversation;
use crate::core::error::ChatError;
use crate::inference::{CompletionProvider, RequestId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingFirstChunk,
    Streaming,
    /// The last request failed. Submitting again is allowed.
    Error(ChatError),
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::AwaitingFirstChunk | SessionState::Streaming
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::AwaitingFirstChunk => write!(f, "Thinking"),
            SessionState::Streaming => write!(f, "Streaming"),
            SessionState::Error(err) => write!(f, "Error: {err}"),
        }
    }
}

pub struct App {
    pub provider: Arc<dyn CompletionProvider>,
    pub model_name: String,
    pub conversation: Conversation,
    pub state: SessionState,
    pub active_request: Option<RequestId>,
    next_request: RequestId,
}

impl App {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        model_name: String,
        system_prompt: &str,
    ) -> Self {
        Self {
            provider,
            model_name,
            conversation: Conversation::new(system_prompt),
            state: SessionState::Idle,
            active_request: None,
            next_request: 1,
        }
    }

    /// Allocates a fresh id and makes it the active request.
    pub fn begin_request(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        self.active_request = Some(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.state, SessionState::Idle);
        assert_eq!(app.model_name, "test-model");
        assert!(app.active_request.is_none());
        assert!(app.conversation.is_empty());
    }

    #[test]
    fn test_request_ids_increase() {
        let mut app = test_app();
        let first = app.begin_request();
        let second = app.begin_request();
        assert!(second > first);
        assert_eq!(app.active_request, Some(second));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::AwaitingFirstChunk.to_string(), "Thinking");
        assert_eq!(
            SessionState::Error(ChatError::Timeout).to_string(),
            "Error: timed out waiting for the model"
        );
        assert!(SessionState::Streaming.is_busy());
        assert!(!SessionState::Error(ChatError::Timeout).is_busy());
    }
}
