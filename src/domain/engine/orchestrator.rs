//! Dialogue engine: one cycle = one agent turn.
//!
//! `produce_next_turn` binds the current phase's parameters, generates
//! the candidate utterance, extracts special tokens, evaluates the
//! transition rules over the dialogue plus the candidate, and only then
//! commits. A failure anywhere before the commit leaves the dialogue
//! and the session state exactly as they were.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::dialogue::{
    Dialogue, Turn, COMPLETION_TOKENS_KEY, LOCALE_KEY, MODEL_KEY, PROMPT_TOKENS_KEY,
};
use crate::domain::foundation::{SessionId, ValidationError};
use crate::domain::phases::{Phase, PhaseRegistry};
use crate::ports::CompletionPort;

use super::errors::EngineError;
use super::state::SessionState;
use super::transition;

/// Orchestration engine for one session.
///
/// Callers own the turn-taking: push the user's turn, then ask for the
/// agent's. Cycles are serialized by `&mut self`; independent sessions
/// are independent engines.
pub struct DialogueEngine {
    session_id: SessionId,
    dialogue: Dialogue,
    state: SessionState,
    registry: PhaseRegistry,
    port: Arc<dyn CompletionPort>,
}

impl DialogueEngine {
    /// Creates an engine for a fresh session with an empty dialogue.
    pub fn new(
        session_id: SessionId,
        state: SessionState,
        registry: PhaseRegistry,
        port: Arc<dyn CompletionPort>,
    ) -> Self {
        Self {
            session_id,
            dialogue: Dialogue::new(),
            state,
            registry,
            port,
        }
    }

    /// Resumes a session from a persisted dialogue and state.
    ///
    /// # Errors
    ///
    /// - `EmptyDialogue` if there is no history to resume from; use
    ///   [`Self::new`] for fresh sessions.
    pub fn resume(
        session_id: SessionId,
        dialogue: Dialogue,
        state: SessionState,
        registry: PhaseRegistry,
        port: Arc<dyn CompletionPort>,
    ) -> Result<Self, EngineError> {
        if dialogue.is_empty() {
            return Err(EngineError::EmptyDialogue);
        }
        Ok(Self {
            session_id,
            dialogue,
            state,
            registry,
            port,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Appends the user's turn to the dialogue.
    pub fn push_user_turn(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let turn = Turn::user(text)?;
        self.dialogue.push(turn);
        Ok(())
    }

    /// Appends a user turn carrying out-of-band metadata, e.g. emotions
    /// picked through the emotion-picker UI.
    pub fn push_user_turn_with_metadata(
        &mut self,
        text: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Result<(), ValidationError> {
        let turn = Turn::user_with_metadata(text, metadata)?;
        self.dialogue.push(turn);
        Ok(())
    }

    /// Runs one cycle and returns the committed agent turn.
    ///
    /// On any error the dialogue gains no turn and the session state is
    /// untouched; the caller may retry the whole cycle.
    pub async fn produce_next_turn(&mut self) -> Result<Turn, EngineError> {
        let phase = self.state.current_phase();

        let parameters = self.bind_parameters(phase)?;
        let mut generator = self.registry.generator(phase).clone();
        generator.update_parameters(parameters);
        generator.set_guidance(self.state.pending_guidance().cloned());

        let utterance = generator.generate(self.port.as_ref(), &self.dialogue).await?;

        let (text, mut metadata) = self.registry.extractor().extract(&utterance.text);
        metadata.insert(
            LOCALE_KEY.to_string(),
            json!(self.state.locale().language_tag()),
        );
        metadata.insert(MODEL_KEY.to_string(), json!(utterance.model));
        metadata.insert(
            PROMPT_TOKENS_KEY.to_string(),
            json!(utterance.usage.prompt_tokens),
        );
        metadata.insert(
            COMPLETION_TOKENS_KEY.to_string(),
            json!(utterance.usage.completion_tokens),
        );
        let candidate = Turn::agent(text, phase, metadata);

        // Rules see the timeline as it would look after the commit.
        let mut staged = self.dialogue.clone();
        staged.push(candidate.clone());
        let outcome =
            transition::evaluate(&self.registry, self.port.as_ref(), &staged, &self.state)
                .await?;

        // Commit point: nothing above mutated the engine.
        self.dialogue.push(candidate.clone());
        match outcome.next_phase {
            Some(next) => {
                if let Some(payload) = outcome.payload {
                    self.state.memoize(phase, payload);
                }
                self.state.set_pending_guidance(outcome.guidance);
                self.state.advance_to(next);
                info!(session = %self.session_id, from = %phase, to = %next, "committed phase transition");
            }
            None => {
                if outcome.guidance.is_some() {
                    self.state.set_pending_guidance(outcome.guidance);
                }
                debug!(session = %self.session_id, %phase, "committed turn without transition");
            }
        }

        Ok(candidate)
    }

    /// Binds the generation parameters for a phase from session facts
    /// and memoized payloads.
    ///
    /// Reading a payload that was never memoized is a hard error raised
    /// before any completion call is made.
    fn bind_parameters(&self, phase: Phase) -> Result<Map<String, Value>, EngineError> {
        let mut parameters = Map::new();
        parameters.insert(
            "locale".to_string(),
            json!(self.state.locale().language_tag()),
        );

        match phase {
            Phase::Explore => {
                parameters.insert("user_name".to_string(), json!(self.state.user_name()));
                parameters.insert("user_age".to_string(), json!(self.state.user_age()));
                let revisited = self
                    .state
                    .payload_field(Phase::Share, "revisited")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                parameters.insert("revisited".to_string(), json!(revisited));
            }
            Phase::Label => {
                parameters.insert(
                    "key_episode".to_string(),
                    self.require_field(Phase::Explore, "key_episode")?,
                );
                parameters.insert(
                    "user_emotion".to_string(),
                    self.require_field(Phase::Explore, "user_emotion")?,
                );
            }
            Phase::Find | Phase::Record | Phase::Share => {
                parameters.insert(
                    "key_episode".to_string(),
                    self.require_field(Phase::Explore, "key_episode")?,
                );
                parameters.insert(
                    "identified_emotions".to_string(),
                    self.require_field(Phase::Label, "identified_emotions")?,
                );
            }
            Phase::Help => {}
        }

        Ok(parameters)
    }

    fn require_field(&self, phase: Phase, key: &str) -> Result<Value, EngineError> {
        match self.state.payload_field(phase, key) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(EngineError::missing_context(phase, key)),
        }
    }
}
