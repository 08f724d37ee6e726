//! Typed decision records produced by the phase summarizers.
//!
//! Each summarizer asks the model to judge the dialogue and answer with
//! a small JSON object. These are the schemas those answers must fit;
//! anything that fails to deserialize counts as malformed output and is
//! retried upstream.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Phase;

/// Marker trait for summarizer output schemas.
pub trait DecisionRecord:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Short label used in logs when this record is produced or rejected.
    fn label() -> &'static str;
}

/// Explore summarizer output: has the user surfaced a key episode and
/// an emotion attached to it?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreDecision {
    /// The episode the user shared, once one has been identified.
    #[serde(default)]
    pub key_episode: Option<String>,

    /// How the user said they felt about it.
    #[serde(default)]
    pub user_emotion: Option<String>,

    /// True once both an episode and an emotion have been surfaced.
    pub move_to_next: bool,

    #[serde(default)]
    pub rationale: String,
}

impl DecisionRecord for ExploreDecision {
    fn label() -> &'static str {
        "explore"
    }
}

/// One emotion the user put a name to during the Label phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedEmotion {
    pub emotion: String,
    /// Why the user feels this way, in the user's own framing.
    pub reason: String,
    pub is_positive: bool,
}

/// Which coping branch the Label summarizer picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextCopingPhase {
    Find,
    Record,
}

impl NextCopingPhase {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Find => Phase::Find,
            Self::Record => Phase::Record,
        }
    }
}

/// Label summarizer output: which emotions were named, and which coping
/// branch fits them.
///
/// `next_phase` stays empty until every named emotion has been
/// empathized with; negative emotions steer towards `find`, positive
/// ones towards `record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDecision {
    pub identified_emotions: Vec<IdentifiedEmotion>,

    pub empathized_all_emotions: bool,

    #[serde(default)]
    pub next_phase: Option<NextCopingPhase>,

    #[serde(default)]
    pub rationale: String,
}

impl LabelDecision {
    /// True if any named emotion is negative.
    pub fn has_negative_emotion(&self) -> bool {
        self.identified_emotions.iter().any(|e| !e.is_positive)
    }
}

impl DecisionRecord for LabelDecision {
    fn label() -> &'static str {
        "label"
    }
}

/// Shared output schema for the Find and Record summarizers.
///
/// Both coping phases finish the same way: strategies were put on the
/// table, their value was explained, and the user actually responded to
/// them. Only the conjunction of all three releases the phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopingDecision {
    /// The agent walked through concrete strategies with the user.
    pub strategies_discussed: bool,

    /// The agent explained why the strategies matter.
    pub importance_explained: bool,

    /// The user reflected on the strategies rather than just listening.
    pub user_reflection_provided: bool,

    #[serde(default)]
    pub rationale: String,
}

impl CopingDecision {
    /// All three coping sub-signals must hold before moving on.
    pub fn proceed_to_next_phase(&self) -> bool {
        self.strategies_discussed && self.importance_explained && self.user_reflection_provided
    }
}

impl DecisionRecord for CopingDecision {
    fn label() -> &'static str {
        "coping"
    }
}

/// Share summarizer output: did the user accept the invitation to talk
/// about a new episode?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareDecision {
    pub share_new_episode: bool,

    #[serde(default)]
    pub rationale: String,
}

impl DecisionRecord for ShareDecision {
    fn label() -> &'static str {
        "share"
    }
}

/// Cross-cutting safety check run before any phase rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveDecision {
    /// True if the dialogue raises self-harm or similarly unsafe topics.
    pub sensitive_topic: bool,

    #[serde(default)]
    pub rationale: String,
}

impl DecisionRecord for SensitiveDecision {
    fn label() -> &'static str {
        "sensitive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod explore {
        use super::*;

        #[test]
        fn round_trips_through_json() {
            let decision = ExploreDecision {
                key_episode: Some("fighting with a friend yesterday".to_string()),
                user_emotion: Some("angry".to_string()),
                move_to_next: true,
                rationale: "episode and emotion both present".to_string(),
            };

            let value = serde_json::to_value(&decision).unwrap();
            let back: ExploreDecision = serde_json::from_value(value).unwrap();
            assert_eq!(back, decision);
        }

        #[test]
        fn optional_fields_default_when_absent() {
            let decision: ExploreDecision =
                serde_json::from_value(json!({"move_to_next": false})).unwrap();

            assert_eq!(decision.key_episode, None);
            assert_eq!(decision.user_emotion, None);
            assert!(!decision.move_to_next);
            assert!(decision.rationale.is_empty());
        }

        #[test]
        fn missing_required_field_is_rejected() {
            let result: Result<ExploreDecision, _> =
                serde_json::from_value(json!({"key_episode": "something"}));
            assert!(result.is_err());
        }
    }

    mod label {
        use super::*;

        #[test]
        fn branch_deserializes_from_snake_case() {
            let decision: LabelDecision = serde_json::from_value(json!({
                "identified_emotions": [
                    {"emotion": "sadness", "reason": "lost a game", "is_positive": false}
                ],
                "empathized_all_emotions": true,
                "next_phase": "find"
            }))
            .unwrap();

            assert_eq!(decision.next_phase, Some(NextCopingPhase::Find));
            assert_eq!(decision.next_phase.unwrap().phase(), Phase::Find);
            assert!(decision.has_negative_emotion());
        }

        #[test]
        fn absent_branch_defaults_to_none() {
            let decision: LabelDecision = serde_json::from_value(json!({
                "identified_emotions": [],
                "empathized_all_emotions": false
            }))
            .unwrap();

            assert_eq!(decision.next_phase, None);
            assert!(!decision.has_negative_emotion());
        }

        #[test]
        fn unknown_branch_is_rejected() {
            let result: Result<LabelDecision, _> = serde_json::from_value(json!({
                "identified_emotions": [],
                "empathized_all_emotions": true,
                "next_phase": "explore"
            }));
            assert!(result.is_err());
        }
    }

    mod coping {
        use super::*;

        #[test]
        fn proceeds_only_when_all_signals_hold() {
            let all = CopingDecision {
                strategies_discussed: true,
                importance_explained: true,
                user_reflection_provided: true,
                rationale: String::new(),
            };
            assert!(all.proceed_to_next_phase());

            let partial = CopingDecision {
                user_reflection_provided: false,
                ..all
            };
            assert!(!partial.proceed_to_next_phase());
        }

        #[test]
        fn round_trips_through_json() {
            let decision = CopingDecision {
                strategies_discussed: true,
                importance_explained: false,
                user_reflection_provided: true,
                rationale: "still explaining".to_string(),
            };

            let value = serde_json::to_value(&decision).unwrap();
            let back: CopingDecision = serde_json::from_value(value).unwrap();
            assert_eq!(back, decision);
        }
    }

    mod share_and_sensitive {
        use super::*;

        #[test]
        fn share_round_trips() {
            let decision: ShareDecision =
                serde_json::from_value(json!({"share_new_episode": true})).unwrap();
            assert!(decision.share_new_episode);
        }

        #[test]
        fn sensitive_round_trips() {
            let decision: SensitiveDecision = serde_json::from_value(
                json!({"sensitive_topic": false, "rationale": "ordinary school talk"}),
            )
            .unwrap();
            assert!(!decision.sensitive_topic);
        }
    }
}
