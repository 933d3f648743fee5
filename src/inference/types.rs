use serde::{Deserialize, Serialize};

/// Who authored a model-context entry (OpenAI chat terminology).
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry of the history sent to the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub role: Role,
    pub content: String,
}

impl ContextEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single increment of streamed output from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// New text appended to the response (a delta, not the running total).
    Content(String),
}
