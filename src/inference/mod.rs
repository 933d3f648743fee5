pub mod driver;
pub mod provider;
pub mod providers;
pub mod types;

pub use driver::{Accumulator, DriverEvent, RequestId, spawn_driver};
pub use provider::{CompletionProvider, CompletionRequest, ProviderError};
pub use providers::OpenAiProvider;
pub use types::{ContextEntry, Role, StreamChunk};
