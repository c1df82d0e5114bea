use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::errors::ProviderError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Subtitle segmentation and layout settings
    #[serde(default)]
    pub subtitles: SubtitleConfig,

    /// Transcription API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Subtitle translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for turning tokens into readable subtitle cues
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubtitleConfig {
    /// Silence (ms) between words that starts a new cue
    #[serde(default = "default_gap_ms")]
    pub gap_ms: i64,

    /// Cues shorter than this (ms) are merged with their successor
    #[serde(default = "default_min_dur_ms")]
    pub min_dur_ms: i64,

    /// Cues longer than this (ms) are split
    #[serde(default = "default_max_dur_ms")]
    pub max_dur_ms: i64,

    /// Maximum reading speed in non-whitespace characters per second
    #[serde(default = "default_max_cps")]
    pub max_cps: f64,

    /// Maximum characters per line
    #[serde(default = "default_max_cpl")]
    pub max_cpl: usize,

    /// Maximum lines per cue
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Characters after which a line break is preferred
    #[serde(default)]
    pub line_split_delimiters: Vec<char>,

    /// End cues at sentence-ending punctuation
    #[serde(default)]
    pub segment_on_sentence: bool,

    /// Start a new cue when the speaker changes
    #[serde(default)]
    pub split_on_speaker: bool,

    /// Mark sentences continued across cues with an ellipsis
    #[serde(default)]
    pub ellipses: bool,
}

impl SubtitleConfig {
    /// Character budget for a whole cue
    pub fn max_total_chars(&self) -> usize {
        self.max_cpl.saturating_mul(self.max_lines)
    }

    /// Replace the preferred delimiters, ignoring whitespace characters
    pub fn set_line_split_delimiters(&mut self, delimiters: &str) {
        self.line_split_delimiters = delimiters.chars().filter(|c| !c.is_whitespace()).collect();
    }
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            gap_ms: default_gap_ms(),
            min_dur_ms: default_min_dur_ms(),
            max_dur_ms: default_max_dur_ms(),
            max_cps: default_max_cps(),
            max_cpl: default_max_cpl(),
            max_lines: default_max_lines(),
            line_split_delimiters: Vec::new(),
            segment_on_sentence: false,
            split_on_speaker: false,
            ellipses: false,
        }
    }
}

/// Transcription service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    /// Service endpoint URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name (e.g., "stt-async-preview")
    #[serde(default = "default_model")]
    pub model: String,

    /// Delay between job status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Keep the uploaded file and the transcription on the server
    #[serde(default)]
    pub keep_remote: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            poll_interval_ms: default_poll_interval_ms(),
            api_key_env: default_api_key_env(),
            keep_remote: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Get the API key from the environment, falling back to a `.env` file
    /// in the current directory
    pub fn resolve_api_key(&self) -> Result<String, ProviderError> {
        self.resolve_api_key_from(Path::new(".env"))
    }

    /// Same as [`ApiConfig::resolve_api_key`] with an explicit `.env` path
    pub fn resolve_api_key_from(&self, env_file: &Path) -> Result<String, ProviderError> {
        lookup_api_key(&self.api_key_env, env_file).ok_or_else(|| {
            ProviderError::AuthenticationError(format!(
                "{var} is not set. Create an API key in the Soniox Console and export it: export {var}=<YOUR_API_KEY>",
                var = self.api_key_env
            ))
        })
    }
}

/// Settings for translating finished subtitles with an OpenAI-compatible LLM
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Translate into this language when set
    #[serde(default)]
    pub target_language: Option<String>,

    /// 1 for a draft only, 3 for draft, review and refine
    #[serde(default = "default_translation_passes")]
    pub passes: u8,

    /// Chat model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Chat completions base URL, including the version path
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Environment variable holding the LLM API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    /// Subtitle entries sent per request; 0 sends everything at once
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Retries of a chunk before it is halved
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: None,
            passes: default_translation_passes(),
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            api_key_env: default_llm_api_key_env(),
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranslationConfig {
    /// Get the LLM API key from the environment, falling back to `.env`
    pub fn resolve_api_key(&self) -> Result<String, ProviderError> {
        self.resolve_api_key_from(Path::new(".env"))
    }

    /// Same as [`TranslationConfig::resolve_api_key`] with an explicit `.env` path
    pub fn resolve_api_key_from(&self, env_file: &Path) -> Result<String, ProviderError> {
        lookup_api_key(&self.api_key_env, env_file).ok_or_else(|| {
            ProviderError::AuthenticationError(format!(
                "{var} is not set. Export it or pass --llm-api-key",
                var = self.api_key_env
            ))
        })
    }
}

// Process environment first, then the .env file
fn lookup_api_key(var: &str, env_file: &Path) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .or_else(|| read_env_file_value(env_file, var))
}

// Looks `key` up in a .env file without touching the process environment
fn read_env_file_value(env_file: &Path, key: &str) -> Option<String> {
    let entries = dotenvy::from_path_iter(env_file).ok()?;
    entries
        .filter_map(Result::ok)
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<&LogLevel> for log::LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_gap_ms() -> i64 {
    1200
}

fn default_min_dur_ms() -> i64 {
    1000
}

fn default_max_dur_ms() -> i64 {
    7000
}

fn default_max_cps() -> f64 {
    17.0
}

fn default_max_cpl() -> usize {
    42
}

fn default_max_lines() -> usize {
    2
}

fn default_base_url() -> String {
    "https://api.soniox.com".to_string()
}

fn default_model() -> String {
    "stt-async-preview".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_api_key_env() -> String {
    "SONIOX_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_translation_passes() -> u8 {
    1
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

fn default_chunk_size() -> usize {
    200
}

fn default_max_retries() -> usize {
    2
}

impl Config {
    /// Load a configuration file, or the defaults when `path` does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let subs = &self.subtitles;

        if !subs.max_cps.is_finite() || subs.max_cps <= 0.0 {
            return Err(anyhow!("max_cps must be a positive number, got {}", subs.max_cps));
        }

        if subs.min_dur_ms > subs.max_dur_ms {
            return Err(anyhow!(
                "min_dur_ms ({}) must not exceed max_dur_ms ({})",
                subs.min_dur_ms,
                subs.max_dur_ms
            ));
        }

        if self.api.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than zero"));
        }

        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api.base_url))?;

        let translation = &self.translation;
        if !matches!(translation.passes, 1 | 3) {
            return Err(anyhow!("translation passes must be 1 or 3, got {}", translation.passes));
        }

        if translation.target_language.as_deref().is_some_and(|lang| lang.trim().is_empty()) {
            return Err(anyhow!("translation target_language must not be empty"));
        }

        url::Url::parse(&translation.base_url)
            .with_context(|| format!("Invalid LLM base URL: {}", translation.base_url))?;

        Ok(())
    }
}
