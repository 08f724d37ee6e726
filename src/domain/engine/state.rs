//! Per-session engine state.
//!
//! Everything the engine needs to continue a conversation lives here:
//! the current phase, payloads memoized by earlier transitions, and the
//! pending guidance record from the last summarizer run. The dialogue
//! log itself is kept separately.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::foundation::{Locale, ValidationError};
use crate::domain::phases::Phase;

use super::errors::StateError;

const MIN_USER_AGE: i32 = 1;
const MAX_USER_AGE: i32 = 120;

/// Session state for one dialogue engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    current_phase: Phase,

    /// Payloads written when a transition left each phase. Read-only
    /// for later phases; overwritten if a phase is revisited.
    #[serde(default)]
    memoized: HashMap<Phase, Value>,

    /// Decision record from the previous cycle's summarizer, fed to the
    /// next generation as guidance.
    #[serde(default)]
    pending_guidance: Option<Value>,

    user_name: String,

    user_age: u32,

    /// Records persisted before locale support load with the default.
    #[serde(default)]
    locale: Locale,
}

impl SessionState {
    /// Creates the initial state for a new session.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the user name is blank
    /// - `OutOfRange` if the age is implausible
    pub fn new(
        user_name: impl Into<String>,
        user_age: u32,
        locale: Locale,
    ) -> Result<Self, ValidationError> {
        let user_name = user_name.into();
        if user_name.trim().is_empty() {
            return Err(ValidationError::empty_field("user_name"));
        }
        let age = user_age as i32;
        if !(MIN_USER_AGE..=MAX_USER_AGE).contains(&age) {
            return Err(ValidationError::out_of_range(
                "user_age",
                MIN_USER_AGE,
                MAX_USER_AGE,
                age,
            ));
        }

        Ok(Self {
            current_phase: Phase::default(),
            memoized: HashMap::new(),
            pending_guidance: None,
            user_name,
            user_age,
            locale,
        })
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn user_age(&self) -> u32 {
        self.user_age
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// The payload memoized when a transition last left `phase`.
    pub fn memoized_payload(&self, phase: Phase) -> Option<&Value> {
        self.memoized.get(&phase)
    }

    /// A single field of a memoized payload.
    pub fn payload_field(&self, phase: Phase, key: &str) -> Option<&Value> {
        self.memoized.get(&phase).and_then(|payload| payload.get(key))
    }

    /// The guidance record staged by the previous cycle, if any.
    pub fn pending_guidance(&self) -> Option<&Value> {
        self.pending_guidance.as_ref()
    }

    pub(crate) fn set_pending_guidance(&mut self, guidance: Option<Value>) {
        self.pending_guidance = guidance;
    }

    /// Writes the payload for a phase being left. Only the transition
    /// commit calls this; payloads never appear without a transition.
    pub(crate) fn memoize(&mut self, phase: Phase, payload: Value) {
        self.memoized.insert(phase, payload);
    }

    pub(crate) fn advance_to(&mut self, phase: Phase) {
        self.current_phase = phase;
    }

    /// Serializes the state into a plain JSON record.
    pub fn dump(&self) -> Result<Value, StateError> {
        serde_json::to_value(self).map_err(|e| StateError::Serialize(e.to_string()))
    }

    /// Restores a state from a record produced by [`Self::dump`].
    ///
    /// Records written before locale support load with the default
    /// locale instead of failing.
    pub fn load(record: Value) -> Result<Self, StateError> {
        serde_json::from_value(record).map_err(|e| StateError::Corrupt(e.to_string()))
    }
}
