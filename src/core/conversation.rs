//! # Conversation
//!
//! One chat session's history, kept in two parallel forms:
//!
//! ```text
//! Conversation
//! ├── transcript: Vec<Message>          // what the user sees
//! ├── model_context: Vec<ContextEntry>  // what the model gets next time
//! ├── awaiting_response: bool
//! ├── last_response_complete: bool
//! └── content_version: u64              // bumped on every transcript mutation
//! ```
//!
//! The transcript holds at most one non-final message, and when it exists it is
//! the last element. The "Thinking" placeholder is display-only and never
//! reaches the model context.

use log::debug;

use crate::core::error::ChatError;
use crate::inference::{ContextEntry, Role};

/// Label shown while waiting for the first chunk of a response.
pub const THINKING_LABEL: &str = "Thinking";

/// Instruction every model context starts with unless configured otherwise.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Do not use markdown except when user asks for it.";

/// A displayed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub content: String,
    pub from_user: bool,
    /// No further chunk updates will arrive for this message.
    pub is_final: bool,
    /// Busy-label stand-in for a response that has not started yet.
    pub is_placeholder: bool,
}

impl Message {
    fn user(content: String) -> Self {
        Self {
            content,
            from_user: true,
            is_final: true,
            is_placeholder: false,
        }
    }

    fn assistant(content: String, is_final: bool) -> Self {
        Self {
            content,
            from_user: false,
            is_final,
            is_placeholder: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    transcript: Vec<Message>,
    model_context: Vec<ContextEntry>,
    system_prompt: String,
    pub awaiting_response: bool,
    pub last_response_complete: bool,
    content_version: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Conversation {
    /// Creates an empty conversation whose model context is seeded with `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            transcript: Vec::new(),
            model_context: vec![ContextEntry::system(system_prompt.clone())],
            system_prompt,
            awaiting_response: false,
            last_response_complete: true,
            content_version: 0,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn model_context(&self) -> &[ContextEntry] {
        &self.model_context
    }

    pub fn content_version(&self) -> u64 {
        self.content_version
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// The trailing message, if it may still change.
    fn trailing_open(&mut self) -> Option<&mut Message> {
        self.transcript.last_mut().filter(|m| !m.is_final)
    }

    fn touch(&mut self) {
        self.content_version = self.content_version.wrapping_add(1);
    }

    /// Appends a user message to both the transcript and the model context.
    ///
    /// Whitespace-only text, or text sent while a response is still open, is
    /// rejected with [`ChatError::InvalidInput`] and nothing changes.
    pub fn append_user(&mut self, text: &str) -> Result<(), ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::InvalidInput);
        }
        if self.transcript.last().is_some_and(|m| !m.is_final) {
            debug!("append_user refused: a response is still open");
            return Err(ChatError::InvalidInput);
        }
        self.transcript.push(Message::user(text.to_string()));
        self.model_context.push(ContextEntry::user(text));
        self.touch();
        Ok(())
    }

    /// Appends the busy placeholder shown until the first chunk arrives.
    ///
    /// Only one open message may exist. A second call panics in debug builds
    /// and is ignored in release builds.
    pub fn append_placeholder(&mut self, label: &str) {
        let open = self.transcript.last().is_some_and(|m| !m.is_final);
        debug_assert!(!open, "placeholder appended while a message is still open");
        if open {
            return;
        }
        self.transcript.push(Message {
            content: label.to_string(),
            from_user: false,
            is_final: false,
            is_placeholder: true,
        });
        self.touch();
    }

    /// Shows `text` (the whole response so far) as the trailing assistant message.
    pub fn apply_chunk(&mut self, text: &str) {
        match self.trailing_open() {
            Some(msg) if !msg.from_user => {
                msg.content.clear();
                msg.content.push_str(text);
                msg.is_placeholder = false;
            }
            _ => self
                .transcript
                .push(Message::assistant(text.to_string(), false)),
        }
        self.last_response_complete = false;
        self.touch();
    }

    /// Closes the response with its full text and records it in the model context.
    ///
    /// Calling this again once the response is closed changes nothing.
    pub fn finalize(&mut self, text: &str) {
        match self.trailing_open() {
            Some(msg) => {
                msg.content.clear();
                msg.content.push_str(text);
                msg.is_final = true;
                msg.is_placeholder = false;
            }
            None => {
                if self.transcript.last().is_some_and(|m| !m.from_user) {
                    debug!("finalize on a closed response; ignoring");
                    return;
                }
                self.transcript.push(Message::assistant(text.to_string(), true));
            }
        }
        self.model_context.push(ContextEntry::assistant(text));
        self.awaiting_response = false;
        self.last_response_complete = true;
        self.touch();
    }

    /// Stops waiting for the current response after a failure.
    ///
    /// A placeholder with no content yet is removed. Partially streamed text
    /// stays visible and is sealed, but never enters the model context.
    pub fn abort_response(&mut self) {
        // Some(true): drop the placeholder, Some(false): partial text sealed
        let open = match self.trailing_open() {
            Some(msg) if msg.is_placeholder => Some(true),
            Some(msg) => {
                msg.is_final = true;
                Some(false)
            }
            None => None,
        };
        if open == Some(true) {
            self.transcript.pop();
        }
        let changed = open.is_some();
        self.awaiting_response = false;
        self.last_response_complete = true;
        if changed {
            self.touch();
        }
    }

    /// Forgets everything except the system instruction.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.model_context.clear();
        self.model_context
            .push(ContextEntry::system(self.system_prompt.clone()));
        self.awaiting_response = false;
        self.last_response_complete = true;
        self.touch();
    }

    /// Loads finished turns from an earlier exchange, e.g. a request body.
    ///
    /// Only user and assistant entries are kept; the system instruction is
    /// always this conversation's own.
    pub fn restore(&mut self, history: impl IntoIterator<Item = ContextEntry>) {
        for entry in history {
            let from_user = match entry.role {
                Role::User => true,
                Role::Assistant => false,
                Role::System => {
                    debug!("restore: skipping system entry");
                    continue;
                }
            };
            self.transcript.push(Message {
                content: entry.content.clone(),
                from_user,
                is_final: true,
                is_placeholder: false,
            });
            self.model_context.push(entry);
        }
        self.touch();
    }

    /// Number of messages that are not final. Never more than one.
    pub fn open_messages(&self) -> usize {
        self.transcript.iter().filter(|m| !m.is_final).count()
    }
}
