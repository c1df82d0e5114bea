use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

use crate::app_config::ApiConfig;
use crate::errors::ProviderError;
use crate::providers::{check_status, AudioSource, JobStatus, TranscriptionProvider};

const SERVICE: &str = "Soniox";
const CREATE_STATUSES: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED];
const READ_STATUSES: &[StatusCode] = &[StatusCode::OK];
const DELETE_STATUSES: &[StatusCode] = &[StatusCode::OK, StatusCode::NO_CONTENT];

/// Soniox client for the asynchronous transcription API
#[derive(Debug, Clone)]
pub struct SonioxClient {
    /// HTTP client for API requests
    client: Client,
    /// API key for bearer authentication
    api_key: String,
    /// API base URL without trailing slash
    base_url: String,
}

/// Response carrying a created resource id
#[derive(Debug, Deserialize)]
struct IdResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Transcription status response
#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

impl SonioxClient {
    /// Create a new Soniox client
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from API settings, resolving the key from the environment
    pub fn from_config(config: &ApiConfig) -> Result<Self, ProviderError> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(api_key, &config.base_url, config.timeout_secs))
    }

    /// Full URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// JSON body for a transcription request
    pub fn transcription_payload(model: &str, source: AudioSource<'_>, extra_options: Option<&Value>) -> Value {
        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::String(model.to_string()));
        match source {
            AudioSource::FileId(id) => payload.insert("file_id".to_string(), Value::String(id.to_string())),
            AudioSource::Url(url) => payload.insert("audio_url".to_string(), Value::String(url.to_string())),
        };
        if let Some(Value::Object(extra)) = extra_options {
            payload.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Value::Object(payload)
    }

    fn require_id(response: IdResponse, action: &str) -> Result<String, ProviderError> {
        response
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::ParseError(format!("{} response carried no id", action)))
    }
}

#[async_trait]
impl TranscriptionProvider for SonioxClient {
    async fn upload_file(&self, path: &Path) -> Result<String, ProviderError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ProviderError::InvalidRequest(format!("cannot read audio file {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .client
            .post(self.endpoint("files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response, SERVICE, CREATE_STATUSES, "File upload").await?;

        Self::require_id(response.json::<IdResponse>().await?, "File upload")
    }

    async fn create_transcription(
        &self,
        model: &str,
        source: AudioSource<'_>,
        extra_options: Option<&Value>,
    ) -> Result<String, ProviderError> {
        let payload = Self::transcription_payload(model, source, extra_options);
        let response = self
            .client
            .post(self.endpoint("transcriptions"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let response = check_status(response, SERVICE, CREATE_STATUSES, "Create transcription").await?;

        Self::require_id(response.json::<IdResponse>().await?, "Create transcription")
    }

    async fn get_status(&self, transcription_id: &str) -> Result<JobStatus, ProviderError> {
        let response = self
            .client
            .get(self.endpoint(&format!("transcriptions/{}", transcription_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = check_status(response, SERVICE, READ_STATUSES, "Polling").await?;

        let body = response.json::<StatusResponse>().await?;
        Ok(JobStatus::from_api(&body.status, body.error_message.as_deref()))
    }

    async fn fetch_transcript(&self, transcription_id: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(self.endpoint(&format!("transcriptions/{}/transcript", transcription_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = check_status(response, SERVICE, READ_STATUSES, "Fetching transcript").await?;

        Ok(response.json::<Value>().await?)
    }

    async fn delete_transcription(&self, transcription_id: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("transcriptions/{}", transcription_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(response, SERVICE, DELETE_STATUSES, "Delete transcription").await?;
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("files/{}", file_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(response, SERVICE, DELETE_STATUSES, "Delete file").await?;
        Ok(())
    }
}
