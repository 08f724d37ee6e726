//! Ports - interfaces between the engine and the outside world.
//!
//! The domain consumes these traits; adapters implement them. Keeping
//! the seams here lets tests swap the LLM and the storage backend for
//! in-memory fakes.

mod completion;
mod state_storage;

pub use completion::{
    ChatMessage, ChatRole, CompletionError, CompletionPort, CompletionRequest,
    CompletionResponse, TokenUsage,
};
pub use state_storage::{SessionStateStorage, StateStorageError};
