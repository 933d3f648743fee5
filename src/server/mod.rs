//! # HTTP Endpoint
//!
//! A stateless front door to the same conversation engine the TUI uses.
//!
//! ## Routes
//!
//! - `POST /api/chat` - JSON array of `{role, content}` in, response text out
//!   as it streams
//! - `GET /teapot` - 418
//!
//! Each call builds its own `Conversation` and driver from the request body
//! and drops both when the stream ends. Nothing is shared between calls except
//! the immutable [`ServerState`].

mod chat;
pub mod error;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use log::info;
use tokio::net::TcpListener;

use crate::core::config::ResolvedConfig;
use crate::inference::{CompletionProvider, OpenAiProvider};

pub use chat::IncomingMessage;
pub use error::ApiError;

/// Process-wide configuration handed to every request.
pub struct ServerState {
    pub provider: Arc<dyn CompletionProvider>,
    pub model_name: String,
    pub system_prompt: String,
    /// Upper bound on a whole call, first byte to last.
    pub request_timeout: Duration,
}

impl ServerState {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            provider: Arc::new(OpenAiProvider::new(
                config.api_key.clone(),
                config.base_url.clone(),
            )),
            model_name: config.model_name.clone(),
            system_prompt: config.system_prompt.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/teapot", get(chat::teapot))
        .with_state(state)
}

/// Binds `0.0.0.0:<port>` and serves until the process is stopped.
pub async fn serve(state: ServerState, port: u16) -> io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(
        "Listening on {} (model={}, timeout={:?})",
        listener.local_addr()?,
        state.model_name,
        state.request_timeout
    );
    axum::serve(listener, router(Arc::new(state))).await
}

/// Resolves the port and runs the endpoint.
pub async fn run(config: ResolvedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.server_port()?;
    serve(ServerState::from_config(&config), port).await?;
    Ok(())
}
