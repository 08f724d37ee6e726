//! Turn entity for the dialogue log.
//!
//! Turns are immutable records of user/agent exchanges. The structured
//! metadata map carries the phase tag, extracted special-token values,
//! completion usage stats, and the locale the turn was produced under.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::phases::Phase;

/// Metadata key for the phase a non-user turn was produced in.
pub const STATE_KEY: &str = "state";
/// Metadata key for the locale a turn was produced under.
pub const LOCALE_KEY: &str = "locale";
/// Metadata key for the completion model name.
pub const MODEL_KEY: &str = "model";
/// Metadata key for prompt token usage.
pub const PROMPT_TOKENS_KEY: &str = "prompt_tokens";
/// Metadata key for completion token usage.
pub const COMPLETION_TOKENS_KEY: &str = "completion_tokens";

/// An immutable turn within a dialogue.
///
/// # Invariants
///
/// - never mutated after being appended to a [`super::Dialogue`]
/// - every non-user turn carries a `state` metadata field equal to the
///   phase that was active when it was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// User-visible text (special tokens already stripped).
    text: String,

    /// True if the user spoke this turn, false for the agent.
    is_user: bool,

    /// Structured side-channel data for this turn.
    #[serde(default)]
    metadata: Map<String, Value>,

    /// When the turn was appended.
    created_at: Timestamp,
}

impl Turn {
    /// Creates a user turn.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the text is empty or whitespace
    pub fn user(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("text"));
        }
        Ok(Self {
            text,
            is_user: true,
            metadata: Map::new(),
            created_at: Timestamp::now(),
        })
    }

    /// Creates a user turn with metadata attached by the caller
    /// (e.g. emotion picks the UI fed back out-of-band).
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the text is empty or whitespace
    pub fn user_with_metadata(
        text: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let mut turn = Self::user(text)?;
        turn.metadata = metadata;
        Ok(turn)
    }

    /// Creates an agent turn produced in the given phase.
    ///
    /// The text may be empty: an utterance consisting solely of special
    /// tokens is legal and strips down to nothing.
    pub fn agent(text: impl Into<String>, phase: Phase, metadata: Map<String, Value>) -> Self {
        let mut metadata = metadata;
        metadata.insert(STATE_KEY.to_string(), Value::String(phase.tag().to_string()));
        Self {
            text: text.into(),
            is_user: false,
            metadata,
            created_at: Timestamp::now(),
        }
    }

    /// Returns the user-visible text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true if the user spoke this turn.
    pub fn is_user(&self) -> bool {
        self.is_user
    }

    /// Returns the metadata map.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns when the turn was appended.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns the phase this turn was produced in, if tagged.
    ///
    /// User turns carry no phase tag.
    pub fn phase(&self) -> Option<Phase> {
        self.metadata
            .get(STATE_KEY)
            .and_then(Value::as_str)
            .and_then(|tag| tag.parse().ok())
    }

    /// Returns true if the metadata flag under `key` is set to `true`.
    pub fn is_flagged(&self, key: &str) -> bool {
        self.metadata.get(key).and_then(Value::as_bool) == Some(true)
    }

    /// Returns a string metadata field, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Returns a numeric metadata field, if present.
    pub fn metadata_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod construction {
        use super::*;

        #[test]
        fn user_turn_has_no_phase() {
            let turn = Turn::user("hello").unwrap();
            assert!(turn.is_user());
            assert_eq!(turn.phase(), None);
        }

        #[test]
        fn user_turn_rejects_empty_text() {
            assert!(Turn::user("").is_err());
            assert!(Turn::user("   ").is_err());
        }

        #[test]
        fn agent_turn_records_source_phase() {
            let turn = Turn::agent("hi there", Phase::Explore, Map::new());
            assert!(!turn.is_user());
            assert_eq!(turn.phase(), Some(Phase::Explore));
        }

        #[test]
        fn agent_turn_allows_empty_text() {
            let turn = Turn::agent("", Phase::Label, Map::new());
            assert_eq!(turn.text(), "");
        }

        #[test]
        fn agent_turn_keeps_caller_metadata() {
            let mut metadata = Map::new();
            metadata.insert("select_emotion".to_string(), json!(true));
            let turn = Turn::agent("pick one", Phase::Label, metadata);

            assert!(turn.is_flagged("select_emotion"));
            assert_eq!(turn.phase(), Some(Phase::Label));
        }

        #[test]
        fn user_turn_with_metadata_keeps_it() {
            let mut metadata = Map::new();
            metadata.insert("picked".to_string(), json!(["Joy", "Trust"]));
            let turn = Turn::user_with_metadata("these two", metadata).unwrap();
            assert_eq!(turn.metadata().get("picked"), Some(&json!(["Joy", "Trust"])));
        }
    }

    mod accessors {
        use super::*;

        #[test]
        fn is_flagged_requires_true() {
            let mut metadata = Map::new();
            metadata.insert("new_episode_requested".to_string(), json!(false));
            let turn = Turn::agent("text", Phase::Share, metadata);
            assert!(!turn.is_flagged("new_episode_requested"));
        }

        #[test]
        fn is_flagged_false_when_absent() {
            let turn = Turn::agent("text", Phase::Share, Map::new());
            assert!(!turn.is_flagged("new_episode_requested"));
        }

        #[test]
        fn metadata_u64_reads_usage_stats() {
            let mut metadata = Map::new();
            metadata.insert(PROMPT_TOKENS_KEY.to_string(), json!(120));
            let turn = Turn::agent("text", Phase::Explore, metadata);
            assert_eq!(turn.metadata_u64(PROMPT_TOKENS_KEY), Some(120));
        }

        #[test]
        fn serde_round_trips() {
            let mut metadata = Map::new();
            metadata.insert(MODEL_KEY.to_string(), json!("gpt-4o"));
            let turn = Turn::agent("hello", Phase::Find, metadata);

            let json = serde_json::to_string(&turn).unwrap();
            let back: Turn = serde_json::from_str(&json).unwrap();
            assert_eq!(turn, back);
        }
    }
}
