/*!
 * Transcript input: recognition tokens and the rules for finding them
 * inside a transcript JSON document.
 */

use std::path::Path;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::SubtitleError;

/// Container keys searched, in order, when a transcript has no top-level token list
pub const TOKEN_CONTAINER_KEYS: &[&str] = &["alternatives", "segments", "paragraphs", "turns", "results"];

/// A single recognition token as produced by the speech engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Text fragment; a leading space marks the start of a new word
    #[serde(default)]
    pub text: String,

    /// Start offset in milliseconds
    #[serde(default, deserialize_with = "deserialize_optional_ms")]
    pub start_ms: Option<i64>,

    /// End offset in milliseconds
    #[serde(default, deserialize_with = "deserialize_optional_ms")]
    pub end_ms: Option<i64>,

    /// Recognition confidence (0.0 - 1.0)
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Speaker label
    #[serde(default, deserialize_with = "deserialize_optional_label")]
    pub speaker: Option<String>,

    /// Language tag
    #[serde(default)]
    pub language: Option<String>,

    /// Whether the token describes a non-speech audio event
    #[serde(default, alias = "audio_event")]
    pub is_audio_event: Option<bool>,
}

impl Token {
    /// Creates a timed token - used by tests and library consumers
    pub fn new(text: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            text: text.into(),
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
            ..Default::default()
        }
    }

    /// Same token with a speaker label attached
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }
}

// Offsets may arrive as integers or floats; floats are floored.
fn deserialize_optional_ms<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        _ => None,
    })
}

// Speaker labels are strings in most payloads but plain numbers in some.
fn deserialize_optional_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Load a transcript JSON document from disk
pub fn load_transcript<P: AsRef<Path>>(path: P) -> Result<Value, SubtitleError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        SubtitleError::InvalidTranscript(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        SubtitleError::InvalidTranscript(format!("failed to parse {}: {}", path.display(), e))
    })
}

/// Extract the ordered token list from a transcript value
///
/// A non-empty top-level `tokens` array wins. Otherwise each key in
/// [`TOKEN_CONTAINER_KEYS`] is tried in order and the first one whose
/// contents yield tokens is used, concatenating the tokens of every
/// element it holds.
pub fn extract_tokens(transcript: &Value) -> Result<Vec<Token>, SubtitleError> {
    let raw = collect_raw_tokens(transcript);
    if raw.is_empty() {
        return Err(SubtitleError::NoTokens);
    }

    let tokens = raw
        .into_iter()
        .map(|value| Token::deserialize(value))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SubtitleError::InvalidTranscript(format!("malformed token: {}", e)))?;

    debug!("Extracted {} tokens from transcript", tokens.len());
    Ok(tokens)
}

fn collect_raw_tokens(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().flat_map(collect_raw_tokens).collect(),
        Value::Object(map) => {
            if let Some(Value::Array(tokens)) = map.get("tokens") {
                if !tokens.is_empty() {
                    return tokens.iter().collect();
                }
            }
            for key in TOKEN_CONTAINER_KEYS {
                if let Some(container) = map.get(*key) {
                    let found = collect_raw_tokens(container);
                    if !found.is_empty() {
                        return found;
                    }
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}
