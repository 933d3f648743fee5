//! OpenAI-compatible provider using the Chat Completions streaming API.
//!
//! Works against any backend that speaks `POST {base_url}/chat/completions`
//! with `stream: true` and answers with SSE `data:` lines:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::inference::{
    CompletionProvider, CompletionRequest, ContextEntry, ProviderError, StreamChunk,
};

/// The hosted API rejects unauthenticated calls; local servers usually don't.
const HOSTED_API_ROOT: &str = "https://api.openai.com";

// ============================================================================
// Chat Completions API Types
// ============================================================================

/// The request body for the Chat Completions endpoint
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ContextEntry],
    stream: bool,
}

/// One streamed `data:` payload
#[derive(Deserialize, Debug)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Error object some backends embed in the stream instead of failing the HTTP call
#[derive(Deserialize, Debug)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

/// What a single SSE line means for the stream.
#[derive(Debug, PartialEq)]
enum SseLine {
    /// Text to forward.
    Delta(String),
    /// `data: [DONE]`.
    Done,
    /// Comments, keep-alives, role-only chunks.
    Skip,
}

/// Interprets one complete SSE line.
///
/// A line that carries a `data:` payload which is not valid JSON is a
/// corrupted stream; an embedded `error` object is a provider-side failure.
fn parse_sse_line(line: &str, status: u16) -> Result<SseLine, ProviderError> {
    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        return Ok(SseLine::Skip);
    };

    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }

    let chunk: ChatChunk =
        serde_json::from_str(data).map_err(|e| ProviderError::Parse(format!("{e}: {data}")))?;

    if let Some(err) = chunk.error {
        return Err(ProviderError::Api {
            status,
            message: err.message,
        });
    }

    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
    {
        Some(text) if !text.is_empty() => Ok(SseLine::Delta(text)),
        _ => Ok(SseLine::Skip),
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// OpenAI-compatible API provider
pub struct OpenAiProvider {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new provider.
    ///
    /// # Arguments
    /// * `api_key` - Bearer token; omitted from requests when `None` (local servers)
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Sends a request to the Chat Completions endpoint and returns the response.
    async fn send_request(
        &self,
        request: &ChatRequest<'_>,
    ) -> Result<reqwest::Response, ProviderError> {
        if self.api_key.is_none() && self.base_url.starts_with(HOSTED_API_ROOT) {
            return Err(ProviderError::Config(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        debug!("Chat completions response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Chat completions API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: err_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        let chat_request = ChatRequest {
            model: request.model,
            messages: request.context,
            stream: true,
        };

        info!(
            "Chat completions request: model={}, message_count={}",
            request.model,
            request.context.len()
        );

        let mut response = self.send_request(&chat_request).await?;
        let status = response.status().as_u16();

        // Bytes are buffered until a full line arrives so multi-byte characters
        // split across network chunks decode correctly.
        let mut buffer: Vec<u8> = Vec::new();
        let mut total_content_len = 0usize;
        let mut chunk_count = 0usize;

        loop {
            let next = response
                .chunk()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            let at_eof = next.is_none();
            match next {
                Some(bytes) => {
                    debug!("Raw chunk received: {} bytes", bytes.len());
                    buffer.extend_from_slice(&bytes);
                }
                // Flush an unterminated final line
                None if !buffer.is_empty() => buffer.push(b'\n'),
                None => {}
            }

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=pos).collect();
                let line = std::str::from_utf8(&raw)
                    .map_err(|e| ProviderError::Parse(format!("invalid UTF-8 in stream: {e}")))?
                    .trim();

                if line.is_empty() {
                    continue;
                }
                debug!("SSE line: {}", line);

                match parse_sse_line(line, status)? {
                    SseLine::Delta(text) => {
                        chunk_count += 1;
                        total_content_len += text.len();
                        debug!(
                            "Sending Content chunk (len={}, total={})",
                            text.len(),
                            total_content_len
                        );
                        if sender.send(StreamChunk::Content(text)).await.is_err() {
                            warn!("Content chunk send failed: receiver dropped");
                            return Err(ProviderError::ChannelClosed);
                        }
                    }
                    SseLine::Done => {
                        info!(
                            "Stream complete: {} chunks, {} content bytes",
                            chunk_count, total_content_len
                        );
                        return Ok(());
                    }
                    SseLine::Skip => {}
                }
            }

            if at_eof {
                break;
            }
        }

        // Connection closed without [DONE]; what arrived is the whole answer.
        info!(
            "Stream ended: {} chunks processed, {} total content bytes",
            chunk_count, total_content_len
        );
        Ok(())
    }
}
