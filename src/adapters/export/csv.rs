//! CSV rendering of a session's dialogue log.

use crate::domain::dialogue::{
    Dialogue, COMPLETION_TOKENS_KEY, MODEL_KEY, NEW_EPISODE_REQUESTED_KEY, PROMPT_TOKENS_KEY,
    SELECT_EMOTION_KEY,
};
use crate::domain::foundation::SessionId;

const HEADER: &str =
    "session,state,select_emotion,new_episode_requested,model,prompt_tokens,completion_tokens";

/// Renders a dialogue as CSV, one row per turn.
///
/// Fields a turn does not carry are left empty; flags render as
/// `true`/`false` only on agent turns that declared them.
pub fn render_session_csv(session_id: SessionId, dialogue: &Dialogue) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for turn in dialogue.turns() {
        let state = turn.phase().map(|p| p.tag()).unwrap_or_default();
        let row = [
            session_id.to_string(),
            state.to_string(),
            turn.is_flagged(SELECT_EMOTION_KEY).to_string(),
            turn.is_flagged(NEW_EPISODE_REQUESTED_KEY).to_string(),
            turn.metadata_str(MODEL_KEY).unwrap_or_default().to_string(),
            turn.metadata_u64(PROMPT_TOKENS_KEY)
                .map(|n| n.to_string())
                .unwrap_or_default(),
            turn.metadata_u64(COMPLETION_TOKENS_KEY)
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::Turn;
    use crate::domain::phases::Phase;
    use serde_json::{json, Map};

    #[test]
    fn header_comes_first() {
        let csv = render_session_csv(SessionId::new(), &Dialogue::new());
        assert_eq!(csv.lines().next(), Some(HEADER));
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn header_carries_only_state_and_metadata_columns() {
        assert_eq!(
            HEADER,
            "session,state,select_emotion,new_episode_requested,model,prompt_tokens,completion_tokens"
        );
    }

    #[test]
    fn one_row_per_turn_with_metadata_columns() {
        let id = SessionId::new();
        let mut dialogue = Dialogue::new();
        dialogue.push(Turn::user("hi").unwrap());

        let mut metadata = Map::new();
        metadata.insert(SELECT_EMOTION_KEY.to_string(), json!(true));
        metadata.insert(MODEL_KEY.to_string(), json!("gpt-4o"));
        metadata.insert(PROMPT_TOKENS_KEY.to_string(), json!(120));
        metadata.insert(COMPLETION_TOKENS_KEY.to_string(), json!(30));
        dialogue.push(Turn::agent("which one fits?", Phase::Label, metadata));

        let csv = render_session_csv(id, &dialogue);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], format!("{},,false,false,,,", id));
        assert_eq!(lines[2], format!("{},label,true,false,gpt-4o,120,30", id));
    }
}
