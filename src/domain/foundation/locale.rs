//! Locale value object for the conversation language.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language the agent converses in.
///
/// The locale is bound into every generator's parameters and recorded
/// on every agent turn. Persisted state records written before locale
/// support existed omit the field, so the default stands in for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    /// Korean (the original deployment language).
    #[default]
    Korean,
    /// English.
    English,
}

impl Locale {
    /// Returns the BCP 47 language tag for this locale.
    pub fn language_tag(&self) -> &'static str {
        match self {
            Self::Korean => "ko",
            Self::English => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.language_tag())
    }
}
