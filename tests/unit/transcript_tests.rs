/*!
 * Tests for transcript loading and token extraction
 */

use anyhow::Result;
use serde_json::json;

use sonioxsrt::errors::SubtitleError;
use sonioxsrt::transcript::{extract_tokens, load_transcript};

use crate::common;

#[test]
fn test_extractTokens_withRealtimeResults_shouldConcatenateEveryResult() {
    let transcript = json!({
        "results": [
            {"tokens": [{"text": "Hi", "start_ms": 0, "end_ms": 100}]},
            {"tokens": [{"text": " there", "start_ms": 100, "end_ms": 300}]}
        ]
    });

    let tokens = extract_tokens(&transcript).unwrap();

    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["Hi", " there"]);
}

#[test]
fn test_extractTokens_withTopLevelArray_shouldTreatElementsAsContainers() {
    let transcript = json!([
        {"tokens": [{"text": "a"}]},
        {"alternatives": [{"tokens": [{"text": "b"}]}]}
    ]);

    let tokens = extract_tokens(&transcript).unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].text, "b");
    assert_eq!(tokens[1].start_ms, None);
}

#[test]
fn test_extractTokens_withOptionalFields_shouldParseAliasesAndLabels() {
    let transcript = json!({"tokens": [
        {"text": "[music]", "start_ms": 10.9, "end_ms": 20, "speaker": 2,
         "audio_event": true, "language": "en", "confidence": 0.5, "extra": "ignored"}
    ]});

    let tokens = extract_tokens(&transcript).unwrap();

    assert_eq!(tokens[0].start_ms, Some(10));
    assert_eq!(tokens[0].speaker.as_deref(), Some("2"));
    assert_eq!(tokens[0].is_audio_event, Some(true));
    assert_eq!(tokens[0].language.as_deref(), Some("en"));
    assert_eq!(tokens[0].confidence, Some(0.5));
}

#[test]
fn test_extractTokens_withMalformedToken_shouldReportInvalidTranscript() {
    let transcript = json!({"tokens": [{"text": 42}]});

    let result = extract_tokens(&transcript);

    assert!(matches!(result, Err(SubtitleError::InvalidTranscript(_))));
}

#[test]
fn test_extractTokens_withEmptyDocument_shouldReportNoTokens() {
    assert!(matches!(extract_tokens(&json!({})), Err(SubtitleError::NoTokens)));
    assert!(matches!(extract_tokens(&json!({"tokens": []})), Err(SubtitleError::NoTokens)));
    assert!(matches!(extract_tokens(&json!("text")), Err(SubtitleError::NoTokens)));
}

#[test]
fn test_loadTranscript_withValidFile_shouldParseJson() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_transcript(temp_dir.path(), "t.json", &common::hello_world_transcript())?;

    let value = load_transcript(&path)?;

    assert_eq!(extract_tokens(&value)?.len(), 3);
    Ok(())
}

#[test]
fn test_loadTranscript_withMissingOrBrokenFile_shouldReportInvalidTranscript() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let broken = common::create_test_file(temp_dir.path(), "broken.json", "{")?;

    assert!(matches!(
        load_transcript(temp_dir.path().join("missing.json")),
        Err(SubtitleError::InvalidTranscript(_))
    ));
    assert!(matches!(load_transcript(&broken), Err(SubtitleError::InvalidTranscript(_))));
    Ok(())
}
