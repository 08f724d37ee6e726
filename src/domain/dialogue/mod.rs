//! Dialogue log: turns, the append-only timeline, and special-token
//! extraction.

mod dialogue;
mod tokens;
mod turn;

pub use dialogue::Dialogue;
pub use tokens::{
    SpecialTokenExtractor, TokenSpec, EMOTION_SELECT_MARKER, NEW_EPISODE_MARKER,
    NEW_EPISODE_REQUESTED_KEY, SELECT_EMOTION_KEY,
};
pub use turn::{
    Turn, COMPLETION_TOKENS_KEY, LOCALE_KEY, MODEL_KEY, PROMPT_TOKENS_KEY, STATE_KEY,
};
