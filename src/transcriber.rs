/*!
 * Remote transcription workflow.
 *
 * Drives a [`TranscriptionProvider`] through upload, job creation, status
 * polling and transcript download, then removes the remote resources it
 * created unless asked to keep them.
 */

use log::{debug, info, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::ApiConfig;
use crate::errors::ProviderError;
use crate::providers::{AudioSource, JobStatus, TranscriptionProvider};

/// Where the audio for a job comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioInput {
    /// Local file, uploaded before the job starts
    File(PathBuf),

    /// Publicly reachable URL fetched by the service
    Url(String),
}

/// A single transcription job description
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Audio to transcribe
    pub audio: AudioInput,

    /// Recognition model name
    pub model: String,

    /// Extra request fields passed through to the service
    pub extra_options: Option<Value>,
}

impl TranscriptionRequest {
    /// Build a request from an optional path and an optional URL
    ///
    /// Exactly one of them must be given.
    pub fn new(
        audio_path: Option<PathBuf>,
        audio_url: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let audio = match (audio_path, audio_url) {
            (Some(path), None) => AudioInput::File(path),
            (None, Some(url)) => AudioInput::Url(url),
            (None, None) => {
                return Err(ProviderError::InvalidRequest(
                    "Specify either an audio file or an audio URL".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(ProviderError::InvalidRequest(
                    "Specify only one of audio file and audio URL".to_string(),
                ));
            }
        };

        Ok(Self {
            audio,
            model: model.into(),
            extra_options: None,
        })
    }

    /// Attach extra request fields
    pub fn with_extra_options(mut self, extra_options: Value) -> Self {
        self.extra_options = Some(extra_options);
        self
    }
}

// Remote resources created during one run
#[derive(Debug, Default)]
struct RemoteResources {
    file_id: Option<String>,
    transcription_id: Option<String>,
}

/// Runs transcription jobs against a provider
#[derive(Debug)]
pub struct Transcriber<P: TranscriptionProvider> {
    provider: P,
    poll_interval: Duration,
    keep_remote: bool,
}

impl<P: TranscriptionProvider> Transcriber<P> {
    /// Create a transcriber polling at `poll_interval`
    pub fn new(provider: P, poll_interval: Duration, keep_remote: bool) -> Self {
        Self {
            provider,
            poll_interval,
            keep_remote,
        }
    }

    /// Create a transcriber using the polling and cleanup settings in `config`
    pub fn with_config(provider: P, config: &ApiConfig) -> Self {
        Self::new(
            provider,
            Duration::from_millis(config.poll_interval_ms),
            config.keep_remote,
        )
    }

    /// Underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Transcribe the requested audio and return the transcript document
    ///
    /// Remote resources are deleted afterwards even when a step failed,
    /// unless `keep_remote` was set. Cleanup failures are only logged.
    pub async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Value, ProviderError> {
        let mut resources = RemoteResources::default();
        let result = self.run(request, &mut resources).await;

        if self.keep_remote {
            if let Some(id) = &resources.transcription_id {
                info!("Keeping remote transcription {}", id);
            }
        } else {
            self.cleanup(&resources).await;
        }

        result
    }

    async fn run(&self, request: &TranscriptionRequest, resources: &mut RemoteResources) -> Result<Value, ProviderError> {
        let file_id = match &request.audio {
            AudioInput::File(path) => {
                info!("Uploading {}", path.display());
                let id = self.provider.upload_file(path).await?;
                debug!("Uploaded file id {}", id);
                resources.file_id = Some(id.clone());
                Some(id)
            }
            AudioInput::Url(_) => None,
        };

        let source = match (&file_id, &request.audio) {
            (Some(id), _) => AudioSource::FileId(id),
            (None, AudioInput::Url(url)) => AudioSource::Url(url),
            (None, AudioInput::File(_)) => {
                return Err(ProviderError::InvalidRequest("upload produced no file id".to_string()));
            }
        };

        let transcription_id = self
            .provider
            .create_transcription(&request.model, source, request.extra_options.as_ref())
            .await?;
        info!("Created transcription {} with model {}", transcription_id, request.model);
        resources.transcription_id = Some(transcription_id.clone());

        self.wait_for_completion(&transcription_id).await?;

        let transcript = self.provider.fetch_transcript(&transcription_id).await?;
        info!("Fetched transcript for {}", transcription_id);
        Ok(transcript)
    }

    /// Poll until the job completes or fails
    pub async fn wait_for_completion(&self, transcription_id: &str) -> Result<(), ProviderError> {
        loop {
            match self.provider.get_status(transcription_id).await? {
                JobStatus::Completed => return Ok(()),
                JobStatus::Error(message) => return Err(ProviderError::TranscriptionFailed(message)),
                status => {
                    debug!("Transcription {} is {:?}", transcription_id, status);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn cleanup(&self, resources: &RemoteResources) {
        if let Some(id) = &resources.transcription_id {
            match self.provider.delete_transcription(id).await {
                Ok(()) => debug!("Deleted transcription {}", id),
                Err(e) => warn!("Failed to delete transcription {}: {}", id, e),
            }
        }
        if let Some(id) = &resources.file_id {
            match self.provider.delete_file(id).await {
                Ok(()) => debug!("Deleted file {}", id),
                Err(e) => warn!("Failed to delete file {}: {}", id, e),
            }
        }
    }
}
