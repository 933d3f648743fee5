//! # TUI Components
//!
//! ### Stateless (props in, pixels out)
//!
//! - `TitleBar`: model name and session state
//! - `TranscriptView`: formatted transcript, pinned to the bottom
//!
//! ### Stateful (event-driven)
//!
//! - `InputBox`: single-line prompt with horizontal scrolling
//!
//! Components receive data as struct fields rather than reading `App`
//! directly, so each one can be rendered on a `TestBackend` in isolation.
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── title_bar.rs
//! ├── transcript_view.rs
//! └── input_box/
//!     ├── mod.rs
//!     └── cursor.rs
//! ```

mod title_bar;
mod transcript_view;

pub mod input_box;

pub use input_box::{InputBox, InputEvent};
pub use title_bar::TitleBar;
pub use transcript_view::TranscriptView;
