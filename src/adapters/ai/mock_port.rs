//! Configurable completion port for tests.
//!
//! Replies are queued ahead of time and handed out in order; every
//! request is captured so tests can assert on prompts, message shapes,
//! and call counts. Clones share the same queue and capture log.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{
    CompletionError, CompletionPort, CompletionRequest, CompletionResponse, TokenUsage,
};

const MOCK_MODEL: &str = "mock-model";

#[derive(Debug, Clone)]
enum QueuedOutcome {
    Reply(CompletionResponse),
    Error(CompletionError),
}

/// Mock [`CompletionPort`] backed by a reply queue.
///
/// When the queue runs dry a generic reply is returned, so tests that
/// only care about call counts need not queue filler.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionPort {
    queue: Arc<Mutex<VecDeque<QueuedOutcome>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a plain text reply with default model and usage.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.with_reply_full(content, MOCK_MODEL, TokenUsage::new(12, 34))
    }

    /// Queues a reply with explicit model and usage.
    pub fn with_reply_full(
        self,
        content: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        self.push(QueuedOutcome::Reply(CompletionResponse {
            content: content.into(),
            model: model.into(),
            usage,
        }));
        self
    }

    /// Queues a transport failure.
    pub fn with_transport_error(self, reason: impl Into<String>) -> Self {
        self.push(QueuedOutcome::Error(CompletionError::transport(reason)));
        self
    }

    /// Queues a malformed-output failure.
    pub fn with_malformed_error(self, reason: impl Into<String>) -> Self {
        self.push(QueuedOutcome::Error(CompletionError::malformed(reason)));
        self
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn push(&self, outcome: QueuedOutcome) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(outcome);
        }
    }
}

#[async_trait]
impl CompletionPort for MockCompletionPort {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }

        let next = match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };

        match next {
            Some(QueuedOutcome::Reply(response)) => Ok(response),
            Some(QueuedOutcome::Error(error)) => Err(error),
            None => Ok(CompletionResponse {
                content: "Okay, tell me more.".to_string(),
                model: MOCK_MODEL.to_string(),
                usage: TokenUsage::new(12, 34),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ChatRole;

    #[tokio::test]
    async fn replies_are_served_in_queue_order() {
        let port = MockCompletionPort::new()
            .with_reply("first")
            .with_reply("second");

        let request = CompletionRequest::new().with_message(ChatRole::User, "hi");
        assert_eq!(port.complete(request.clone()).await.unwrap().content, "first");
        assert_eq!(port.complete(request).await.unwrap().content, "second");
    }

    #[tokio::test]
    async fn exhausted_queue_serves_a_default_reply() {
        let port = MockCompletionPort::new();
        let response = port
            .complete(CompletionRequest::new())
            .await
            .unwrap();
        assert_eq!(response.model, "mock-model");
        assert!(!response.content.is_empty());
    }

    #[tokio::test]
    async fn clones_share_queue_and_capture_log() {
        let port = MockCompletionPort::new().with_reply("only one");
        let clone = port.clone();

        clone.complete(CompletionRequest::new()).await.unwrap();

        assert_eq!(port.call_count(), 1);
        let second = port.complete(CompletionRequest::new()).await.unwrap();
        assert_ne!(second.content, "only one");
    }

    #[tokio::test]
    async fn queued_errors_interleave_with_replies() {
        let port = MockCompletionPort::new()
            .with_transport_error("down")
            .with_reply("back up");

        let err = port.complete(CompletionRequest::new()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)));
        assert!(port.complete(CompletionRequest::new()).await.is_ok());
    }
}
