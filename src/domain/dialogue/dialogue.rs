//! Append-only dialogue log.
//!
//! Insertion order is the canonical timeline; no turn is ever deleted
//! or mutated after append.

use serde::{Deserialize, Serialize};

use crate::domain::phases::Phase;

use super::turn::Turn;

/// Ordered, append-only sequence of turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dialogue {
    turns: Vec<Turn>,
}

impl Dialogue {
    /// Creates an empty dialogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn to the log.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if no turn has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the turns in timeline order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Counts agent turns in the most recent contiguous run tagged with
    /// `phase`, walking backwards from the end.
    ///
    /// User turns do not break the run; an agent turn tagged with a
    /// different phase does. This is the turn-count guard input for the
    /// transition rules.
    pub fn agent_turns_in_current_phase(&self, phase: Phase) -> usize {
        let mut count = 0;
        for turn in self.turns.iter().rev() {
            if turn.is_user() {
                continue;
            }
            match turn.phase() {
                Some(p) if p == phase => count += 1,
                _ => break,
            }
        }
        count
    }

    /// Returns the index of the most recent turn whose metadata flag
    /// under `key` is `true`.
    pub fn last_flagged_index(&self, key: &str) -> Option<usize> {
        self.turns.iter().rposition(|turn| turn.is_flagged(key))
    }

    /// Returns the suffix of the timeline starting at `index`.
    pub fn suffix_from(&self, index: usize) -> &[Turn] {
        &self.turns[index.min(self.turns.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn agent(text: &str, phase: Phase) -> Turn {
        Turn::agent(text, phase, Map::new())
    }

    fn user(text: &str) -> Turn {
        Turn::user(text).unwrap()
    }

    mod append_only {
        use super::*;

        #[test]
        fn push_preserves_timeline_order() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("hello", Phase::Explore));
            dialogue.push(user("hi"));

            assert_eq!(dialogue.len(), 2);
            assert!(!dialogue.turns()[0].is_user());
            assert!(dialogue.turns()[1].is_user());
        }

        #[test]
        fn empty_dialogue_has_no_last_turn() {
            assert!(Dialogue::new().last().is_none());
        }
    }

    mod phase_segment_counting {
        use super::*;

        #[test]
        fn counts_agent_turns_in_current_run() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Explore));
            dialogue.push(user("u1"));
            dialogue.push(agent("a2", Phase::Explore));

            assert_eq!(dialogue.agent_turns_in_current_phase(Phase::Explore), 2);
        }

        #[test]
        fn user_turns_do_not_break_the_run() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Label));
            dialogue.push(user("u1"));
            dialogue.push(user("u2"));
            dialogue.push(agent("a2", Phase::Label));

            assert_eq!(dialogue.agent_turns_in_current_phase(Phase::Label), 2);
        }

        #[test]
        fn earlier_phase_turns_break_the_run() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Explore));
            dialogue.push(agent("a2", Phase::Explore));
            dialogue.push(agent("a3", Phase::Label));

            assert_eq!(dialogue.agent_turns_in_current_phase(Phase::Label), 1);
        }

        #[test]
        fn revisited_phase_counts_only_the_recent_run() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Explore));
            dialogue.push(agent("a2", Phase::Share));
            dialogue.push(agent("a3", Phase::Explore));

            assert_eq!(dialogue.agent_turns_in_current_phase(Phase::Explore), 1);
        }

        #[test]
        fn zero_when_phase_never_visited() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Explore));

            assert_eq!(dialogue.agent_turns_in_current_phase(Phase::Share), 0);
        }
    }

    mod flagged_lookup {
        use super::*;

        #[test]
        fn finds_most_recent_flagged_turn() {
            let mut flagged = Map::new();
            flagged.insert("new_episode_requested".to_string(), json!(true));

            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Share));
            dialogue.push(Turn::agent("a2", Phase::Share, flagged.clone()));
            dialogue.push(user("u1"));

            assert_eq!(dialogue.last_flagged_index("new_episode_requested"), Some(1));
        }

        #[test]
        fn none_when_flag_never_set() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Share));

            assert_eq!(dialogue.last_flagged_index("new_episode_requested"), None);
        }

        #[test]
        fn suffix_from_returns_tail() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Share));
            dialogue.push(user("u1"));
            dialogue.push(user("u2"));

            let suffix = dialogue.suffix_from(1);
            assert_eq!(suffix.len(), 2);
            assert!(suffix[0].is_user());
        }

        #[test]
        fn suffix_from_clamps_out_of_range_index() {
            let mut dialogue = Dialogue::new();
            dialogue.push(agent("a1", Phase::Share));

            assert!(dialogue.suffix_from(10).is_empty());
        }
    }
}
