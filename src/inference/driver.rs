//! # Streaming Response Driver
//!
//! Wraps one in-flight completion request and turns the provider's deltas
//! into a sequence of session-level events:
//!
//! ```text
//! provider:  "Hi"      " there"        "!"          <end>
//!              │           │             │             │
//! driver:   Partial("Hi")  Partial("Hi there")  Partial("Hi there!")  Complete("Hi there!")
//! ```
//!
//! Accumulation happens here and only here. Every `Partial` carries the full
//! text received so far, so consumers replace rather than append.
//!
//! The driver runs on its own task and never touches session state. Events go
//! through the `deliver` callback, which returns `false` once the receiving
//! side is gone; the driver then stops quietly.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::error::ChatError;
use crate::inference::{CompletionProvider, CompletionRequest, ContextEntry, StreamChunk};

/// Identifies one started request within a session.
pub type RequestId = u64;

/// Output of a single completion request, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// Everything received so far. One per received unit.
    Partial(String),
    /// Terminal. The full response text (possibly empty).
    Complete(String),
    /// Terminal. Nothing follows.
    Failed(ChatError),
}

impl DriverEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DriverEvent::Partial(_))
    }
}

/// Running total of a response's text.
#[derive(Debug, Default)]
pub struct Accumulator {
    content: String,
    units: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one unit and returns the `Partial` event for it.
    pub fn push(&mut self, delta: &str) -> DriverEvent {
        self.content.push_str(delta);
        self.units += 1;
        DriverEvent::Partial(self.content.clone())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of units received so far.
    pub fn units(&self) -> usize {
        self.units
    }

    /// Consumes the accumulator into the `Complete` event.
    pub fn finish(self) -> DriverEvent {
        DriverEvent::Complete(self.content)
    }
}

/// Starts a streaming request on a new task.
///
/// `context` is a snapshot of the model context taken at submission time.
/// `deliver` is called once per event, in order; it must not block.
pub fn spawn_driver<F>(
    provider: Arc<dyn CompletionProvider>,
    context: Vec<ContextEntry>,
    model: String,
    mut deliver: F,
) -> JoinHandle<()>
where
    F: FnMut(DriverEvent) -> bool + Send + 'static,
{
    info!(
        "Starting stream via '{}': model={}, context_len={}",
        provider.name(),
        model,
        context.len()
    );

    tokio::spawn(async move {
        let (chunk_tx, chunk_rx) = mpsc::channel::<StreamChunk>(100);
        let mut accumulator = Accumulator::new();
        let mut receiver_alive = true;

        let stream = async {
            let request = CompletionRequest {
                context: &context,
                model: &model,
            };
            provider.stream_completion(request, chunk_tx).await
        };

        // Owns the receiver so the provider's sends fail once forwarding stops
        let forward = async {
            let mut chunk_rx = chunk_rx;
            while let Some(chunk) = chunk_rx.recv().await {
                let StreamChunk::Content(delta) = chunk;
                let event = accumulator.push(&delta);
                debug!(
                    "Partial #{} (delta={}, total={})",
                    accumulator.units(),
                    delta.len(),
                    accumulator.content().len()
                );
                if !deliver(event) {
                    warn!("Driver receiver dropped; stopping stream");
                    receiver_alive = false;
                    return;
                }
            }
        };

        let (result, ()) = tokio::join!(stream, forward);

        if !receiver_alive {
            return;
        }

        let terminal = match result {
            Ok(()) => {
                info!(
                    "Stream finished: {} units, {} bytes",
                    accumulator.units(),
                    accumulator.content().len()
                );
                accumulator.finish()
            }
            Err(e) => {
                warn!("Stream failed after {} units: {}", accumulator.units(), e);
                DriverEvent::Failed(ChatError::from(e))
            }
        };

        if !deliver(terminal) {
            debug!("Terminal event dropped: receiver gone");
        }
    })
}
