/*!
 * Provider implementations for remote services.
 *
 * This module contains the provider interfaces and their clients:
 * - Soniox: asynchronous speech-to-text over HTTPS
 * - OpenAI: chat completions for subtitle translation, including
 *   OpenAI-compatible servers
 */

use async_trait::async_trait;
use log::error;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::fmt::Debug;
use std::path::Path;

use crate::errors::ProviderError;

/// Audio source for a transcription job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSource<'a> {
    /// A file previously uploaded to the provider
    FileId(&'a str),

    /// A publicly reachable audio URL
    Url(&'a str),
}

/// Lifecycle state of a remote transcription job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted but not started
    Queued,

    /// Being transcribed
    Processing,

    /// Transcript is ready
    Completed,

    /// The job failed with the given message
    Error(String),
}

impl JobStatus {
    /// Map a raw status string, with its optional error message
    pub fn from_api(status: &str, error_message: Option<&str>) -> Self {
        match status {
            "completed" => Self::Completed,
            "error" => Self::Error(error_message.unwrap_or("unknown error").to_string()),
            "queued" => Self::Queued,
            _ => Self::Processing,
        }
    }

    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error(_))
    }
}

/// Common trait for all transcription providers
///
/// The transcriber drives every provider through these calls, so tests
/// can substitute an in-memory implementation for the HTTP client.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync + Debug {
    /// Upload a local audio file, returning its remote id
    async fn upload_file(&self, path: &Path) -> Result<String, ProviderError>;

    /// Start a transcription job, returning its id
    ///
    /// # Arguments
    /// * `model` - Recognition model name
    /// * `source` - Uploaded file or audio URL
    /// * `extra_options` - Additional request fields merged into the payload
    async fn create_transcription(
        &self,
        model: &str,
        source: AudioSource<'_>,
        extra_options: Option<&Value>,
    ) -> Result<String, ProviderError>;

    /// Current status of a transcription job
    async fn get_status(&self, transcription_id: &str) -> Result<JobStatus, ProviderError>;

    /// Download the finished transcript document
    async fn fetch_transcript(&self, transcription_id: &str) -> Result<Value, ProviderError>;

    /// Delete a transcription job
    async fn delete_transcription(&self, transcription_id: &str) -> Result<(), ProviderError>;

    /// Delete an uploaded file
    async fn delete_file(&self, file_id: &str) -> Result<(), ProviderError>;
}

/// Token accounting reported by a language model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Text answer of a language model call
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text
    pub text: String,

    /// Usage, when the provider reports it
    pub usage: Option<TokenUsage>,
}

/// Common trait for chat language models
///
/// One call answers one system and user prompt pair.
#[async_trait]
pub trait LanguageModel: Send + Sync + Debug {
    /// Answer `user_prompt` under `system_prompt`
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Completion, ProviderError>;

    /// Model name for logs and statistics
    fn model_name(&self) -> &str;
}

// Turn an unexpected HTTP status into a provider error
pub(crate) async fn check_status(
    response: Response,
    service: &str,
    accepted: &[StatusCode],
    action: &str,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    error!("{} API error during {} ({}): {}", service, action, status, message);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::AuthenticationError(format!("{} rejected: {}", action, message)));
    }
    Err(ProviderError::ApiError {
        status_code: status.as_u16(),
        message: format!("{} failed: {}", action, message),
    })
}

pub mod openai;
pub mod soniox;
