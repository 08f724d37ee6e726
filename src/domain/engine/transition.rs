//! Transition rules: decide whether a cycle's candidate turn moves the
//! session to a new phase.
//!
//! Turn-count guards are checked before any summarizer is invoked, so
//! a blocked phase costs no completion calls at all. Once a guard
//! passes, the sensitive-topic check runs first and short-circuits to
//! Help; only then does the phase's own summarizer get a say. Share has
//! no turn-count guard, so the sensitive check runs there every cycle,
//! whether or not a new-episode prompt has been answered yet.

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::domain::dialogue::{Dialogue, Turn, NEW_EPISODE_REQUESTED_KEY};
use crate::domain::phases::{Phase, PhaseRegistry};
use crate::ports::CompletionPort;

use super::errors::EngineError;
use super::state::SessionState;

/// Agent turns required in Explore before its summarizer runs.
pub const EXPLORE_MIN_AGENT_TURNS: usize = 2;
/// Agent turns required in Label, both before the summarizer runs and
/// at the branch it selects.
pub const LABEL_MIN_AGENT_TURNS: usize = 3;
/// Agent turns required in Find or Record before their summarizer runs.
pub const COPING_MIN_AGENT_TURNS: usize = 2;

/// Result of evaluating the rules for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransitionOutcome {
    /// The phase to switch to, if a transition fired.
    pub next_phase: Option<Phase>,
    /// Payload to memoize under the source phase, only on transition.
    pub payload: Option<Value>,
    /// Decision record to stash as guidance for the next cycle;
    /// `None` means no summarizer ran and existing guidance stands.
    pub guidance: Option<Value>,
}

impl TransitionOutcome {
    fn stay(guidance: Option<Value>) -> Self {
        Self {
            next_phase: None,
            payload: None,
            guidance,
        }
    }

    fn advance(to: Phase, payload: Option<Value>, guidance: Option<Value>) -> Self {
        Self {
            next_phase: Some(to),
            payload,
            guidance,
        }
    }
}

/// Evaluates the transition rules over a dialogue that already includes
/// the cycle's candidate turn. Never mutates anything.
pub(crate) async fn evaluate(
    registry: &PhaseRegistry,
    port: &dyn CompletionPort,
    dialogue: &Dialogue,
    state: &SessionState,
) -> Result<TransitionOutcome, EngineError> {
    let phase = state.current_phase();
    let agent_turns = dialogue.agent_turns_in_current_phase(phase);

    // Turn-count guards first: a blocked phase runs no summarizer at all.
    match phase {
        Phase::Explore if agent_turns < EXPLORE_MIN_AGENT_TURNS => {
            debug!(%phase, agent_turns, "turn-count guard blocked evaluation");
            return Ok(TransitionOutcome::stay(None));
        }
        Phase::Label if agent_turns < LABEL_MIN_AGENT_TURNS => {
            debug!(%phase, agent_turns, "turn-count guard blocked evaluation");
            return Ok(TransitionOutcome::stay(None));
        }
        Phase::Find | Phase::Record if agent_turns < COPING_MIN_AGENT_TURNS => {
            debug!(%phase, agent_turns, "turn-count guard blocked evaluation");
            return Ok(TransitionOutcome::stay(None));
        }
        Phase::Help => return Ok(TransitionOutcome::stay(None)),
        _ => {}
    }

    let sensitive = registry
        .sensitive_summarizer()
        .run(port, dialogue.turns())
        .await?;
    if sensitive.sensitive_topic {
        info!(from = %phase, rationale = %sensitive.rationale, "sensitive topic, diverting to help");
        return Ok(TransitionOutcome::advance(Phase::Help, None, None));
    }

    match phase {
        Phase::Explore => {
            let window = phase_window(dialogue, phase);
            let decision = registry.explore_summarizer().run(port, window).await?;
            let record = record_value(&decision);
            if decision.move_to_next {
                info!(from = %phase, to = %Phase::Label, "explore surfaced an episode");
                Ok(TransitionOutcome::advance(
                    Phase::Label,
                    Some(record.clone()),
                    Some(record),
                ))
            } else {
                Ok(TransitionOutcome::stay(Some(record)))
            }
        }
        Phase::Label => {
            let window = phase_window(dialogue, phase);
            let mut summarizer = registry.label_summarizer().clone();
            summarizer.update_parameters(summarizer_context(state, phase));
            let decision = summarizer.run(port, window).await?;
            let record = record_value(&decision);
            match decision.next_phase {
                Some(branch) if agent_turns >= LABEL_MIN_AGENT_TURNS => {
                    let to = branch.phase();
                    info!(from = %phase, to = %to, "label selected a coping branch");
                    Ok(TransitionOutcome::advance(
                        to,
                        Some(record.clone()),
                        Some(record),
                    ))
                }
                _ => Ok(TransitionOutcome::stay(Some(record))),
            }
        }
        Phase::Find | Phase::Record => {
            let window = phase_window(dialogue, phase);
            let mut summarizer = registry.coping_summarizer(phase).clone();
            summarizer.update_parameters(summarizer_context(state, phase));
            let decision = summarizer.run(port, window).await?;
            let record = record_value(&decision);
            if decision.proceed_to_next_phase() {
                info!(from = %phase, to = %Phase::Share, "coping signals complete");
                Ok(TransitionOutcome::advance(
                    Phase::Share,
                    Some(record.clone()),
                    Some(record),
                ))
            } else {
                Ok(TransitionOutcome::stay(Some(record)))
            }
        }
        Phase::Share => {
            // The summarizer only has something to judge once a
            // new-episode prompt has a user answer after it.
            let index = match dialogue.last_flagged_index(NEW_EPISODE_REQUESTED_KEY) {
                Some(index) if index + 1 < dialogue.len() => index,
                _ => {
                    debug!(%phase, "no answered new-episode prompt, staying");
                    return Ok(TransitionOutcome::stay(None));
                }
            };
            let mut summarizer = registry.share_summarizer().clone();
            summarizer.update_parameters(summarizer_context(state, phase));
            let decision = summarizer.run(port, dialogue.suffix_from(index)).await?;
            let record = record_value(&decision);
            if decision.share_new_episode {
                info!(from = %phase, to = %Phase::Explore, "user offered a new episode");
                Ok(TransitionOutcome::advance(
                    Phase::Explore,
                    Some(json!({ "revisited": true })),
                    Some(record),
                ))
            } else {
                Ok(TransitionOutcome::stay(Some(record)))
            }
        }
        Phase::Help => Ok(TransitionOutcome::stay(None)),
    }
}

/// Context parameters a phase's summarizer judges the window against,
/// pulled from earlier phases' memoized payloads.
///
/// The orchestrator validated these bindings before generating, so a
/// missing field here can only mean the template has no use for it;
/// unbound placeholders render through untouched.
fn summarizer_context(state: &SessionState, phase: Phase) -> Map<String, Value> {
    let mut context = Map::new();
    let mut bind = |key: &str, source: Phase| {
        if let Some(value) = state.payload_field(source, key) {
            context.insert(key.to_string(), value.clone());
        }
    };

    match phase {
        Phase::Label => {
            bind("key_episode", Phase::Explore);
            bind("user_emotion", Phase::Explore);
        }
        Phase::Find | Phase::Record | Phase::Share => {
            bind("key_episode", Phase::Explore);
            bind("identified_emotions", Phase::Label);
        }
        Phase::Explore | Phase::Help => {}
    }

    context
}

/// The suffix of the dialogue covering the current contiguous run of
/// the given phase, user turns included.
fn phase_window(dialogue: &Dialogue, phase: Phase) -> &[Turn] {
    let turns = dialogue.turns();
    let mut start = 0;
    for (i, turn) in turns.iter().enumerate().rev() {
        if turn.is_user() {
            continue;
        }
        match turn.phase() {
            Some(p) if p == phase => start = i,
            _ => break,
        }
    }
    &turns[start..]
}

/// Decision records are plain data; serialization cannot realistically
/// fail, and a null payload is preferable to aborting a good cycle.
fn record_value<D: serde::Serialize>(decision: &D) -> Value {
    serde_json::to_value(decision).unwrap_or(Value::Null)
}
