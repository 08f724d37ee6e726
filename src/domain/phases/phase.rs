//! Conversation phases.
//!
//! A phase determines which generation and transition policy drives the
//! agent's next utterance. Phases form a closed set; the engine is in
//! exactly one phase at a time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The current phase of the conversation.
///
/// Phases flow in a general order but can loop:
/// - `Explore` → `Label` → (`Find` | `Record`) → `Share` → `Explore` (revisit)
///
/// `Help` is an auxiliary phase reachable from every other phase when the
/// sensitive-topic check flags the dialogue; there is no explicit terminal
/// phase — the machine may remain in `Share` or `Help` indefinitely pending
/// external termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Build rapport and surface a key episode with an associated emotion.
    #[default]
    Explore,

    /// Help the user label the emotions around the key episode.
    Label,

    /// Work out coping strategies for a negative emotion.
    Find,

    /// Encourage recording moments of positive emotion.
    Record,

    /// Wrap up and invite sharing a new episode.
    Share,

    /// Divert to supportive guidance after a sensitive topic was raised.
    Help,
}

impl Phase {
    /// All phases, in the canonical forward order.
    pub const ALL: [Phase; 6] = [
        Phase::Explore,
        Phase::Label,
        Phase::Find,
        Phase::Record,
        Phase::Share,
        Phase::Help,
    ];

    /// Returns the snake_case tag used in turn metadata and persisted state.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Label => "label",
            Self::Find => "find",
            Self::Record => "record",
            Self::Share => "share",
            Self::Help => "help",
        }
    }

    /// Returns all phases the transition rules can select from this phase.
    ///
    /// `Help` is reachable from everywhere via the sensitive-topic check,
    /// so it appears in every list.
    pub fn valid_next_phases(&self) -> Vec<Self> {
        match self {
            Self::Explore => vec![Self::Label, Self::Help],
            Self::Label => vec![Self::Find, Self::Record, Self::Help],
            Self::Find => vec![Self::Share, Self::Help],
            Self::Record => vec![Self::Share, Self::Help],
            Self::Share => vec![Self::Explore, Self::Help],
            Self::Help => vec![Self::Help],
        }
    }

    /// Returns true if the transition rules can ever move from self to target.
    pub fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_next_phases().contains(target)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Phase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explore" => Ok(Self::Explore),
            "label" => Ok(Self::Label),
            "find" => Ok(Self::Find),
            "record" => Ok(Self::Record),
            "share" => Ok(Self::Share),
            "help" => Ok(Self::Help),
            other => Err(ValidationError::invalid_format(
                "phase",
                format!("unknown phase tag '{}'", other),
            )),
        }
    }
}
