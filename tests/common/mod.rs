/*!
 * Common test utilities for the sonioxsrt test suite
 */

use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use sonioxsrt::transcript::Token;


/// Route library logs to the test harness
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Token JSON value
pub fn token(text: &str, start_ms: i64, end_ms: i64) -> Value {
    json!({"text": text, "start_ms": start_ms, "end_ms": end_ms})
}

/// The one-cue "Hello world." transcript
pub fn hello_world_transcript() -> Value {
    json!({"tokens": [
        token("Hello", 0, 500),
        token(" world", 500, 1000),
        token(".", 1000, 1000)
    ]})
}

/// A two-sentence transcript with a long pause between the sentences
pub fn two_sentence_transcript() -> Value {
    json!({"tokens": [
        token("Good", 0, 400),
        token(" morning", 400, 900),
        token(" everyone", 900, 1500),
        token(".", 1500, 1500),
        token(" Let's", 4000, 4300),
        token(" begin", 4300, 4800),
        token(".", 4800, 4800)
    ]})
}

/// Writes `transcript` as JSON into `dir`
pub fn create_test_transcript(dir: &Path, filename: &str, transcript: &Value) -> Result<PathBuf> {
    create_test_file(dir, filename, &serde_json::to_string_pretty(transcript)?)
}

/// Evenly timed tokens, one per word, each with a leading space after the first
pub fn timed_words(words: &[&str], word_ms: i64) -> Vec<Token> {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let text = if i == 0 { word.to_string() } else { format!(" {}", word) };
            let start = i as i64 * word_ms;
            Token::new(text, start, start + word_ms)
        })
        .collect()
}
