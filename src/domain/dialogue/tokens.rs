//! Special-token extraction.
//!
//! Generated text may embed in-band control markers ("special tokens")
//! denoting side-channel signals, e.g. "show the emotion picker". The
//! extractor strips them from the user-visible text and records them as
//! turn metadata. Extraction is idempotent and never fails on absence.

use serde_json::{Map, Value};

/// Marker emitted when the agent wants the UI to show the emotion picker.
pub const EMOTION_SELECT_MARKER: &str = "<|EmotionSelect|>";
/// Marker emitted when the agent asks whether to share a new episode.
pub const NEW_EPISODE_MARKER: &str = "<|NewEpisode|>";

/// Metadata key recorded when the emotion picker marker is present.
pub const SELECT_EMOTION_KEY: &str = "select_emotion";
/// Metadata key recorded when the new-episode marker is present.
pub const NEW_EPISODE_REQUESTED_KEY: &str = "new_episode_requested";

/// Declaration of one special token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    /// The literal marker to look for in generated text.
    pub marker: &'static str,
    /// The metadata key to record under when the marker is found.
    pub metadata_key: &'static str,
    /// If true, the marker's presence records `metadata_key = true`;
    /// otherwise the text trailing the marker on its line is captured
    /// as the metadata value.
    pub is_flag: bool,
}

impl TokenSpec {
    /// Declares a boolean presence flag token.
    pub const fn flag(marker: &'static str, metadata_key: &'static str) -> Self {
        Self {
            marker,
            metadata_key,
            is_flag: true,
        }
    }

    /// Declares a token whose trailing line payload is captured.
    pub const fn with_payload(marker: &'static str, metadata_key: &'static str) -> Self {
        Self {
            marker,
            metadata_key,
            is_flag: false,
        }
    }
}

/// Scans generated text for special tokens, strips them, and collects
/// the signals they denote.
#[derive(Debug, Clone)]
pub struct SpecialTokenExtractor {
    specs: Vec<TokenSpec>,
}

impl SpecialTokenExtractor {
    /// Creates an extractor with the given token table.
    pub fn new(specs: Vec<TokenSpec>) -> Self {
        Self { specs }
    }

    /// The token table used by the emotion chatbot.
    pub fn standard() -> Self {
        Self::new(vec![
            TokenSpec::flag(EMOTION_SELECT_MARKER, SELECT_EMOTION_KEY),
            TokenSpec::flag(NEW_EPISODE_MARKER, NEW_EPISODE_REQUESTED_KEY),
        ])
    }

    /// Returns the token table.
    pub fn specs(&self) -> &[TokenSpec] {
        &self.specs
    }

    /// Extracts all declared tokens from `text`.
    ///
    /// Returns the cleaned user-visible text and the metadata fields the
    /// found markers denote. Absent markers contribute nothing; running
    /// extraction on already-cleaned text returns it unchanged with an
    /// empty metadata map.
    pub fn extract(&self, text: &str) -> (String, Map<String, Value>) {
        let mut cleaned = text.to_string();
        let mut metadata = Map::new();

        for spec in &self.specs {
            if !cleaned.contains(spec.marker) {
                continue;
            }

            if spec.is_flag {
                metadata.insert(spec.metadata_key.to_string(), Value::Bool(true));
                // Loop: stripping can butt two halves of a marker together.
                while cleaned.contains(spec.marker) {
                    cleaned = cleaned.replace(spec.marker, "");
                }
            } else {
                let payload = Self::trailing_payload(&cleaned, spec.marker);
                if !payload.is_empty() {
                    metadata.insert(
                        spec.metadata_key.to_string(),
                        Value::String(payload.clone()),
                    );
                }
                cleaned = Self::strip_marker_lines(&cleaned, spec.marker);
            }
        }

        (Self::tidy(&cleaned), metadata)
    }

    /// Text after the first occurrence of `marker`, up to end of line.
    fn trailing_payload(text: &str, marker: &str) -> String {
        let start = match text.find(marker) {
            Some(pos) => pos + marker.len(),
            None => return String::new(),
        };
        let rest = &text[start..];
        let line = rest.split('\n').next().unwrap_or("");
        line.trim().to_string()
    }

    /// Removes `marker` and everything after it on each line it appears on.
    fn strip_marker_lines(text: &str, marker: &str) -> String {
        text.split('\n')
            .map(|line| match line.find(marker) {
                Some(pos) => line[..pos].trim_end(),
                None => line,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Normalizes whitespace left behind by stripped markers.
    fn tidy(text: &str) -> String {
        let collapsed = text
            .split('\n')
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        collapsed.trim().to_string()
    }
}

impl Default for SpecialTokenExtractor {
    fn default() -> Self {
        Self::standard()
    }
}
