//! # Core Session Logic
//!
//! The conversation engine. It knows nothing about terminals or HTTP.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │                         │
//!                    │  • Conversation         │
//!                    │  • App + SessionState   │
//!                    │  • Action / update()    │
//!                    │                         │
//!                    │  No I/O. No UI.         │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │   HTTP     │
//!           │  session   │              │  /api/chat │
//!           │ (ratatui)  │              │  (axum)    │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`conversation`]: transcript + model context for one session
//! - [`state`]: the `App` struct and `SessionState`
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`error`]: `ChatError`
//! - [`config`]: layered configuration

pub mod action;
pub mod config;
pub mod conversation;
pub mod error;
pub mod state;

pub use conversation::{Conversation, Message};
pub use error::ChatError;
