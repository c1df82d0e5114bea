/*!
 * Error types for the sonioxsrt application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a transcription provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The remote transcription job ended in an error state
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The caller asked for something the provider cannot do
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors that can occur while turning a transcript into subtitles
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// No usable token list in the transcript
    #[error("No tokens found in transcript")]
    NoTokens,

    /// The transcript could not be read or its tokens are malformed
    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    /// Segmentation produced nothing to render
    #[error("No subtitle segments produced from transcript")]
    NoSegments,
}

/// Errors that can occur while translating subtitle entries
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the language model provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model answer could not be matched to the requested lines
    #[error("Translation response mismatch: {0}")]
    ResponseMismatch(String),

    /// The model answered with nothing usable
    #[error("Empty translation response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}
