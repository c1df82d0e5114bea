/*!
 * # sonioxsrt
 *
 * A Rust library for turning Soniox speech-to-text transcripts into
 * readable SRT subtitles.
 *
 * ## Features
 *
 * - Extract recognition tokens from synchronous and realtime transcript JSON
 * - Merge token fragments into words, including CJK text without spaces
 * - Cut cues at silences, speaker changes and sentence boundaries
 * - Enforce reading speed, duration and line length limits
 * - Wrap cue text into lines at safe boundaries or preferred delimiters
 * - Submit audio to the Soniox asynchronous API and fetch the transcript
 * - Translate finished cues with an OpenAI-compatible chat model
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `transcript`: Token type and transcript token extraction
 * - `segmentation`: Word assembly, segmentation, readability and wrapping
 * - `subtitle_processor`: Cue numbering and SRT rendering
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `providers`: Transcription and language model interfaces, Soniox and OpenAI clients
 * - `transcriber`: Upload, poll, fetch and cleanup of remote jobs
 * - `translation`: Chunked draft, review and refine translation of cues
 * - `app_controller`: Main application workflows
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod segmentation;
pub mod subtitle_processor;
pub mod transcriber;
pub mod transcript;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, SubtitleConfig};
pub use errors::{ProviderError, SubtitleError, TranslationError};
pub use segmentation::{tokens_to_segments, Segment};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use transcript::{extract_tokens, Token};
pub use translation::{TranslationPasses, TranslationStats, Translator};

use serde_json::Value;

/// Convert a transcript document straight to SRT text
pub fn transcript_to_srt(transcript: &Value, config: &SubtitleConfig) -> Result<String, SubtitleError> {
    let collection = SubtitleCollection::from_transcript(std::path::PathBuf::new(), transcript, config)?;
    Ok(collection.to_srt_string())
}
