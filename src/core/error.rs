//! # Chat Errors
//!
//! The error kinds a conversation can run into. `InvalidInput` is handled
//! locally (the action is ignored); every other kind moves the session into
//! its error state and is shown to the user.

use std::fmt;

use crate::inference::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Empty submission. Ignored, never surfaced.
    InvalidInput,
    /// Could not reach the backend, or the stream broke off.
    TransportFailure(String),
    /// The backend sent an incremental payload we could not decode.
    StreamCorruption(String),
    /// The call exceeded its fixed time budget.
    Timeout,
}

impl ChatError {
    /// Short label for status lines and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            ChatError::InvalidInput => "invalid input",
            ChatError::TransportFailure(_) => "transport failure",
            ChatError::StreamCorruption(_) => "stream corruption",
            ChatError::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::InvalidInput => write!(f, "invalid input: message is empty"),
            ChatError::TransportFailure(msg) => write!(f, "transport failure: {msg}"),
            ChatError::StreamCorruption(msg) => write!(f, "stream corruption: {msg}"),
            ChatError::Timeout => write!(f, "timed out waiting for the model"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Parse(msg) => ChatError::StreamCorruption(msg),
            other => ChatError::TransportFailure(other.to_string()),
        }
    }
}
