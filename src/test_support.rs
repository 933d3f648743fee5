//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::conversation::DEFAULT_SYSTEM_PROMPT;
use crate::core::state::App;
use crate::inference::{CompletionProvider, CompletionRequest, ProviderError, StreamChunk};

#[derive(Debug, Clone)]
enum Ending {
    Done,
    Network(String),
    Parse(String),
    /// Never returns after the last delta.
    Hang,
}

/// A provider that replays a fixed list of deltas, then ends the way it was told to.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    deltas: Vec<String>,
    ending: Ending,
}

impl ScriptedProvider {
    pub fn new(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|d| d.to_string()).collect(),
            ending: Ending::Done,
        }
    }

    pub fn fail_with_network(mut self, message: &str) -> Self {
        self.ending = Ending::Network(message.to_string());
        self
    }

    pub fn fail_with_parse(mut self, message: &str) -> Self {
        self.ending = Ending::Parse(message.to_string());
        self
    }

    pub fn hang(mut self) -> Self {
        self.ending = Ending::Hang;
        self
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_completion(
        &self,
        _request: CompletionRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        for delta in &self.deltas {
            sender
                .send(StreamChunk::Content(delta.clone()))
                .await
                .map_err(|_| ProviderError::ChannelClosed)?;
        }

        match &self.ending {
            Ending::Done => Ok(()),
            Ending::Network(msg) => Err(ProviderError::Network(msg.clone())),
            Ending::Parse(msg) => Err(ProviderError::Parse(msg.clone())),
            Ending::Hang => std::future::pending().await,
        }
    }
}

/// Creates a test App backed by a provider that answers with nothing.
pub fn test_app() -> App {
    App::new(
        Arc::new(ScriptedProvider::new(&[])),
        "test-model".to_string(),
        DEFAULT_SYSTEM_PROMPT,
    )
}
