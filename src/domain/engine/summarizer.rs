//! Phase summarizer: asks the model for a structured judgement of the
//! dialogue and parses the reply into a typed decision record.
//!
//! Models wrap JSON in prose and markdown fences no matter how firmly
//! the instruction forbids it, so the reply goes through a fence scan
//! and a balanced-brace scan before deserialization. Malformed output
//! is retried with a fresh sampling up to the attempt budget.

use serde_json::{Map, Value};
use std::marker::PhantomData;
use tracing::{debug, warn};

use crate::domain::dialogue::Turn;
use crate::domain::phases::DecisionRecord;
use crate::ports::{ChatRole, CompletionError, CompletionPort, CompletionRequest};

use super::errors::SummarizerError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const SUMMARIZER_TEMPERATURE: f32 = 0.3;
const SUMMARIZER_MAX_TOKENS: u32 = 512;

/// One worked example appended to the summarizer instruction.
#[derive(Debug, Clone)]
pub struct FewShotExample {
    pub transcript: String,
    pub decision: String,
}

impl FewShotExample {
    pub fn new(transcript: impl Into<String>, decision: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            decision: decision.into(),
        }
    }
}

/// A summarizer producing decision records of type `D`.
///
/// Like the generator, the instruction template carries `{name}`
/// placeholders resolved from bound context parameters, e.g. the
/// memoized episode a later phase judges the dialogue against.
#[derive(Debug, Clone)]
pub struct LlmSummarizer<D> {
    instruction: String,
    parameters: Map<String, Value>,
    examples: Vec<FewShotExample>,
    max_attempts: u32,
    _decision: PhantomData<D>,
}

impl<D: DecisionRecord> LlmSummarizer<D> {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            parameters: Map::new(),
            examples: Vec::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            _decision: PhantomData,
        }
    }

    pub fn with_examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.examples = examples;
        self
    }

    pub fn examples(&self) -> &[FewShotExample] {
        &self.examples
    }

    /// Merges new context parameter bindings over the existing ones.
    pub fn update_parameters(&mut self, parameters: Map<String, Value>) {
        for (key, value) in parameters {
            self.parameters.insert(key, value);
        }
    }

    /// Sets the attempt budget for malformed output. Clamped to at
    /// least one attempt.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Runs the summarizer over a dialogue window.
    ///
    /// Malformed replies (unparseable JSON, schema mismatch, or a
    /// `Malformed` port error) consume one attempt each; transport
    /// failures abort immediately.
    pub async fn run(
        &self,
        port: &dyn CompletionPort,
        window: &[Turn],
    ) -> Result<D, SummarizerError> {
        let request = self.build_request(window);

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match port.complete(request.clone()).await {
                Ok(response) => match Self::parse(&response.content) {
                    Ok(decision) => {
                        debug!(
                            summarizer = D::label(),
                            attempt, "summarizer produced a decision record"
                        );
                        return Ok(decision);
                    }
                    Err(reason) => {
                        warn!(
                            summarizer = D::label(),
                            attempt, %reason, "summarizer reply was malformed"
                        );
                        last_error = reason;
                    }
                },
                Err(CompletionError::Malformed(reason)) => {
                    warn!(
                        summarizer = D::label(),
                        attempt, %reason, "completion port reported malformed output"
                    );
                    last_error = reason;
                }
                Err(CompletionError::Transport(reason)) => {
                    return Err(SummarizerError::Transport(reason));
                }
            }
        }

        Err(SummarizerError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    /// Renders the system prompt: template with context placeholders
    /// resolved, followed by the few-shot examples.
    fn render_instruction(&self) -> String {
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

        for example in &self.examples {
            rendered.push_str("\n\n[Example]\n");
            rendered.push_str(&example.transcript);
            rendered.push_str("\n[Answer]\n");
            rendered.push_str(&example.decision);
        }

        rendered
    }

    fn build_request(&self, window: &[Turn]) -> CompletionRequest {
        CompletionRequest::new()
            .with_system_prompt(self.render_instruction())
            .with_message(ChatRole::User, transcript(window))
            .with_temperature(SUMMARIZER_TEMPERATURE)
            .with_max_tokens(SUMMARIZER_MAX_TOKENS)
    }

    fn parse(reply: &str) -> Result<D, String> {
        let json = extract_json(reply).ok_or_else(|| "no JSON object in reply".to_string())?;
        let value: Value =
            serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {}", e))?;
        serde_json::from_value(value).map_err(|e| format!("schema mismatch: {}", e))
    }
}

/// Flattens a dialogue window into a speaker-tagged transcript.
fn transcript(window: &[Turn]) -> String {
    window
        .iter()
        .map(|turn| {
            let speaker = if turn.is_user() { "user" } else { "agent" };
            format!("{}: {}", speaker, turn.text())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pulls the first JSON object out of a model reply.
///
/// Tries fenced code blocks first, then a balanced-brace scan over the
/// raw text.
fn extract_json(reply: &str) -> Option<String> {
    let trimmed = reply.trim();

    if let Some(json) = extract_from_code_block(trimmed) {
        return Some(json);
    }

    let start = trimmed.find('{')?;
    extract_balanced_object(trimmed, start)
}

fn extract_from_code_block(s: &str) -> Option<String> {
    let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for pattern in patterns {
        if let Some(start) = s.find(pattern) {
            let body_start = start + pattern.len();
            if let Some(end) = s[body_start..].find("```") {
                return Some(s[body_start..body_start + end].trim().to_string());
            }
        }
    }
    None
}

fn extract_balanced_object(s: &str, start: usize) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
