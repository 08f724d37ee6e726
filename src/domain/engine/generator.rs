//! Phase generator: turns the dialogue into the agent's next utterance.
//!
//! A generator is an instruction template plus the parameters bound for
//! the current cycle. The orchestrator rebinds parameters every cycle
//! (locale always, phase-specific context from memoized payloads) and
//! attaches the previous cycle's decision record as guidance.

use serde_json::{Map, Value};

use crate::domain::dialogue::{Dialogue, TokenSpec};
use crate::ports::{
    ChatMessage, CompletionError, CompletionPort, CompletionRequest, TokenUsage,
};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 256;

/// Raw output of one generation, before special-token extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedUtterance {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// An instruction template with per-cycle parameter bindings.
#[derive(Debug, Clone)]
pub struct LlmGenerator {
    instruction: String,
    parameters: Map<String, Value>,
    guidance: Option<Value>,
    token_specs: Vec<TokenSpec>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmGenerator {
    /// Creates a generator from an instruction template.
    ///
    /// `{name}` placeholders in the template are substituted from the
    /// bound parameters at generation time; unbound placeholders are
    /// left untouched.
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            parameters: Map::new(),
            guidance: None,
            token_specs: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Declares the special tokens this phase's utterances may emit.
    pub fn with_token_specs(mut self, specs: Vec<TokenSpec>) -> Self {
        self.token_specs = specs;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Merges new parameter bindings over the existing ones.
    pub fn update_parameters(&mut self, parameters: Map<String, Value>) {
        for (key, value) in parameters {
            self.parameters.insert(key, value);
        }
    }

    /// Attaches (or clears) the previous cycle's decision record.
    pub fn set_guidance(&mut self, guidance: Option<Value>) {
        self.guidance = guidance;
    }

    pub fn token_specs(&self) -> &[TokenSpec] {
        &self.token_specs
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Renders the system prompt: template with placeholders resolved,
    /// followed by the guidance block when one is attached.
    pub fn render_instruction(&self) -> String {
        let mut rendered = self.instruction.clone();
        for (key, value) in &self.parameters {
            let placeholder = format!("{{{}}}", key);
            if !rendered.contains(&placeholder) {
                continue;
            }
            let substitute = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            rendered = rendered.replace(&placeholder, &substitute);
        }

        if let Some(guidance) = &self.guidance {
            rendered.push_str("\n\n[Dialogue analysis]\n");
            rendered.push_str(&guidance.to_string());
        }

        rendered
    }

    /// Generates the next utterance for the dialogue.
    pub async fn generate(
        &self,
        port: &dyn CompletionPort,
        dialogue: &Dialogue,
    ) -> Result<GeneratedUtterance, CompletionError> {
        let mut request = CompletionRequest::new()
            .with_system_prompt(self.render_instruction())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        for turn in dialogue.turns() {
            let message = if turn.is_user() {
                ChatMessage::user(turn.text())
            } else {
                ChatMessage::assistant(turn.text())
            };
            request.messages.push(message);
        }

        let response = port.complete(request).await?;

        Ok(GeneratedUtterance {
            text: response.content,
            model: response.model,
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockCompletionPort;
    use crate::domain::phases::Phase;
    use crate::domain::dialogue::Turn;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    mod rendering {
        use super::*;

        #[test]
        fn substitutes_bound_parameters() {
            let mut generator = LlmGenerator::new("Talking with {user_name}, age {user_age}.");
            generator.update_parameters(params(&[
                ("user_name", json!("Dana")),
                ("user_age", json!(9)),
            ]));

            assert_eq!(
                generator.render_instruction(),
                "Talking with Dana, age 9."
            );
        }

        #[test]
        fn unbound_placeholders_survive() {
            let generator = LlmGenerator::new("Speak in {locale}.");
            assert_eq!(generator.render_instruction(), "Speak in {locale}.");
        }

        #[test]
        fn rebinding_overwrites_previous_values() {
            let mut generator = LlmGenerator::new("{revisited}");
            generator.update_parameters(params(&[("revisited", json!(false))]));
            generator.update_parameters(params(&[("revisited", json!(true))]));

            assert_eq!(generator.render_instruction(), "true");
        }

        #[test]
        fn guidance_block_is_appended() {
            let mut generator = LlmGenerator::new("Base instruction.");
            generator.set_guidance(Some(json!({"move_to_next": false})));

            let rendered = generator.render_instruction();
            assert!(rendered.starts_with("Base instruction."));
            assert!(rendered.contains("[Dialogue analysis]"));
            assert!(rendered.contains("\"move_to_next\":false"));
        }

        #[test]
        fn clearing_guidance_removes_the_block() {
            let mut generator = LlmGenerator::new("Base.");
            generator.set_guidance(Some(json!({"a": 1})));
            generator.set_guidance(None);

            assert_eq!(generator.render_instruction(), "Base.");
        }
    }

    mod generation {
        use super::*;

        #[tokio::test]
        async fn maps_dialogue_turns_to_chat_roles() {
            let port = MockCompletionPort::new().with_reply("How was your day?");
            let mut dialogue = Dialogue::new();
            dialogue.push(Turn::agent("hello", Phase::Explore, Map::new()));
            dialogue.push(Turn::user("hi").unwrap());

            let generator = LlmGenerator::new("instruction");
            let utterance = generator.generate(&port, &dialogue).await.unwrap();

            assert_eq!(utterance.text, "How was your day?");
            let calls = port.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].messages.len(), 2);
            assert_eq!(calls[0].messages[0], ChatMessage::assistant("hello"));
            assert_eq!(calls[0].messages[1], ChatMessage::user("hi"));
            assert_eq!(calls[0].system_prompt.as_deref(), Some("instruction"));
        }

        #[tokio::test]
        async fn transport_failure_propagates() {
            let port = MockCompletionPort::new().with_transport_error("connection refused");
            let generator = LlmGenerator::new("instruction");

            let result = generator.generate(&port, &Dialogue::new()).await;
            assert!(matches!(result, Err(CompletionError::Transport(_))));
        }
    }
}
