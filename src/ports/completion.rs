//! Completion Port - interface to the LLM behind the engine.
//!
//! Everything the engine asks of a language model goes through this
//! port: phase generators asking for the next utterance and phase
//! summarizers asking for a structured judgement. Adapters translate
//! to a concrete API (OpenAI-compatible HTTP, or a mock in tests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for LLM completions.
#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// Generates a single completion for the given request.
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, CompletionError>;
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Conversation messages, oldest first.
    pub messages: Vec<ChatMessage>,
    /// System prompt guiding the model.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Appends a message to the conversation.
    pub fn with_message(mut self, role: ChatRole, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(role, content));
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the token budget.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// A message in the completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name used by OpenAI-style APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
    /// Model that produced it.
    pub model: String,
    /// Token usage, recorded into turn metadata for the session export.
    pub usage: TokenUsage,
}

/// Token usage for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Completion failures, split by what the caller can do about them.
///
/// `Malformed` means the model answered but the answer is unusable; a
/// fresh sampling may succeed, so summarizers retry these within their
/// attempt budget. `Transport` means the service itself failed and the
/// whole cycle fails.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("malformed completion: {0}")]
    Malformed(String),

    #[error("completion transport failure: {0}")]
    Transport(String),
}

impl CompletionError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    /// True if a fresh sampling of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_accumulates_fields() {
        let request = CompletionRequest::new()
            .with_system_prompt("be kind")
            .with_message(ChatRole::User, "hello")
            .with_message(ChatRole::Assistant, "hi")
            .with_max_tokens(256)
            .with_temperature(0.7);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.system_prompt.as_deref(), Some("be kind"));
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.temperature, Some(0.7));
    }

    #[test]
    fn chat_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(ChatRole::System.as_str(), "system");
    }

    #[test]
    fn token_usage_totals() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.total(), 150);
        assert_eq!(TokenUsage::zero().total(), 0);
    }

    #[test]
    fn only_malformed_is_retryable() {
        assert!(CompletionError::malformed("bad json").is_retryable());
        assert!(!CompletionError::transport("connection refused").is_retryable());
    }

    #[test]
    fn errors_display_their_reason() {
        let err = CompletionError::malformed("no JSON object found");
        assert_eq!(err.to_string(), "malformed completion: no JSON object found");
    }
}
