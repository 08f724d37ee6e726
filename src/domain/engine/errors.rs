//! Error types for the orchestration engine.

use thiserror::Error;

use crate::domain::phases::Phase;
use crate::ports::CompletionError;

/// Failure of one summarizer run.
#[derive(Debug, Clone, Error)]
pub enum SummarizerError {
    /// Every attempt produced output that failed to parse or validate.
    #[error("summarizer output stayed malformed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The completion service itself failed; retrying is pointless.
    #[error("summarizer transport failure: {0}")]
    Transport(String),
}

/// Failure of one engine cycle.
///
/// Any of these aborts the cycle before commit: the dialogue gains no
/// turn and the session state is left exactly as it was.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A generator needed a memoized payload that was never written.
    #[error("no memoized payload from phase '{phase}' provides required parameter '{key}'")]
    MissingContext { phase: Phase, key: String },

    #[error("transition summarizer failed: {0}")]
    Summarizer(#[from] SummarizerError),

    #[error("utterance generation failed: {0}")]
    Completion(#[from] CompletionError),

    /// A session was resumed with no dialogue history to resume from.
    #[error("cannot resume a session from an empty dialogue")]
    EmptyDialogue,
}

impl EngineError {
    /// Creates a missing-context error for a parameter binding.
    pub fn missing_context(phase: Phase, key: impl Into<String>) -> Self {
        Self::MissingContext {
            phase,
            key: key.into(),
        }
    }
}

/// Failure of the state serialization adapter.
#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("state record failed to serialize: {0}")]
    Serialize(String),

    #[error("state record is corrupt: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_names_phase_and_key() {
        let err = EngineError::missing_context(Phase::Explore, "key_episode");
        let text = err.to_string();
        assert!(text.contains("explore"));
        assert!(text.contains("key_episode"));
    }

    #[test]
    fn retries_exhausted_reports_attempt_count() {
        let err = SummarizerError::RetriesExhausted {
            attempts: 3,
            last_error: "missing field `move_to_next`".to_string(),
        };
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn completion_error_converts_into_engine_error() {
        let err: EngineError = CompletionError::transport("boom").into();
        assert!(matches!(err, EngineError::Completion(_)));
    }
}
