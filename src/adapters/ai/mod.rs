//! Completion port adapters.
//!
//! - `MockCompletionPort` - configurable mock for tests
//! - `OpenAiCompletionPort` - OpenAI-compatible chat-completions HTTP API

mod mock_port;
mod openai_port;

pub use mock_port::MockCompletionPort;
pub use openai_port::{OpenAiCompletionPort, OpenAiConfig};
