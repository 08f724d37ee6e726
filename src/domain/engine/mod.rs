//! The dialogue engine: session state, phase generators and
//! summarizers, transition rules, and the cycle orchestrator.

mod errors;
mod generator;
mod orchestrator;
mod state;
mod summarizer;
mod transition;

pub use errors::{EngineError, StateError, SummarizerError};
pub use generator::{GeneratedUtterance, LlmGenerator};
pub use orchestrator::DialogueEngine;
pub use state::SessionState;
pub use summarizer::{FewShotExample, LlmSummarizer};
pub use transition::{COPING_MIN_AGENT_TURNS, EXPLORE_MIN_AGENT_TURNS, LABEL_MIN_AGENT_TURNS};
