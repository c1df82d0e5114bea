use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::providers::{LanguageModel, TranscriptionProvider};
use crate::subtitle_processor::SubtitleCollection;
use crate::transcriber::{TranscriptionRequest, Transcriber};
use crate::translation::{TranslationPasses, TranslationStats, Translator};

// @module: Application controller for transcript conversion and transcription

/// Outcome counts of a folder conversion
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FolderSummary {
    /// Files converted
    pub converted: usize,
    /// Files skipped because the output already existed
    pub skipped: usize,
    /// Files that failed
    pub failed: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert a transcript file or every transcript under a directory
    pub fn convert(&self, input: &Path, output: Option<&Path>, force_overwrite: bool) -> Result<()> {
        if FileManager::dir_exists(input) {
            let summary = self.convert_folder(input, force_overwrite)?;
            if summary.failed > 0 {
                warn!("{} transcript(s) failed to convert", summary.failed);
            }
            Ok(())
        } else {
            self.convert_file(input, output).map(|_| ())
        }
    }

    /// Convert one transcript JSON file to SRT, returning the written path
    ///
    /// Without an explicit output the SRT lands next to the input.
    pub fn convert_file(&self, input_file: &Path, output_file: Option<&Path>) -> Result<PathBuf> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| FileManager::generate_output_path(input_file, None, "srt"));

        let collection = SubtitleCollection::from_transcript_file(input_file, &self.config.subtitles)
            .with_context(|| format!("Failed to convert transcript: {:?}", input_file))?;
        collection.write_to_srt(&output_path)?;

        info!(
            "Converted {:?} -> {:?} ({} cues in {})",
            input_file,
            output_path,
            collection.entries.len(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(output_path)
    }

    /// Convert one transcript file and translate its cues before writing
    ///
    /// Cue timings and numbering come from the source language; only the
    /// text is replaced.
    pub async fn convert_file_translated<M: LanguageModel>(
        &self,
        input_file: &Path,
        output_file: Option<&Path>,
        translator: &Translator<M>,
        passes: TranslationPasses,
    ) -> Result<(PathBuf, TranslationStats)> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| FileManager::generate_output_path(input_file, None, "srt"));

        let mut collection = SubtitleCollection::from_transcript_file(input_file, &self.config.subtitles)
            .with_context(|| format!("Failed to convert transcript: {:?}", input_file))?;

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(format!(
            "Translating {} cues to {} with {}",
            collection.entries.len(),
            translator.target_language(),
            translator.model().model_name()
        ));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let mut stats = TranslationStats::new();
        let result = translator.translate(&collection.entries, passes, &mut stats).await;
        spinner.finish_and_clear();
        collection.entries = result.context("Translation failed")?;

        collection.write_to_srt(&output_path)?;

        info!(
            "Translated {:?} -> {:?} ({} cues in {})",
            input_file,
            output_path,
            collection.entries.len(),
            Self::format_duration(start_time.elapsed())
        );
        Ok((output_path, stats))
    }

    /// Convert every `*.json` transcript under `input_dir` to a sibling `.srt`
    ///
    /// Existing outputs are skipped unless `force_overwrite` is set. A
    /// failing file is logged and counted without stopping the run.
    pub fn convert_folder(&self, input_dir: &Path, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let transcripts = FileManager::find_files(input_dir, "json")?;
        if transcripts.is_empty() {
            return Err(anyhow!("No transcript files found in directory: {:?}", input_dir));
        }

        let folder_pb = ProgressBar::new(transcripts.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));
        folder_pb.set_message("Converting transcripts");

        let mut summary = FolderSummary::default();

        for transcript in &transcripts {
            let file_name = transcript
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Converting: {}", file_name));

            let output_path = FileManager::generate_output_path(transcript, None, "srt");
            if output_path.exists() && !force_overwrite {
                warn!("Skipping {}, subtitles already exist (use --force to overwrite)", file_name);
                summary.skipped += 1;
                folder_pb.inc(1);
                continue;
            }

            match self.convert_file(transcript, Some(&output_path)) {
                Ok(_) => summary.converted += 1,
                Err(e) => {
                    error!("Error converting {}: {:#}", file_name, e);
                    summary.failed += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_and_clear();

        info!(
            "Folder conversion completed in {}: {} converted, {} skipped, {} errors",
            Self::format_duration(start_time.elapsed()),
            summary.converted,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// Transcribe audio remotely, save the JSON and optionally an SRT
    pub async fn transcribe<P: TranscriptionProvider>(
        &self,
        provider: P,
        request: &TranscriptionRequest,
        output_json: &Path,
        output_srt: Option<&Path>,
    ) -> Result<Value> {
        let start_time = Instant::now();
        let transcriber = Transcriber::with_config(provider, &self.config.api);

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(format!("Transcribing with {}", request.model));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = transcriber.transcribe(request).await;
        spinner.finish_and_clear();
        let transcript = result.context("Transcription failed")?;

        FileManager::write_json(output_json, &transcript)?;
        info!(
            "Saved transcript to {:?} ({})",
            output_json,
            Self::format_duration(start_time.elapsed())
        );

        if let Some(srt_path) = output_srt {
            let collection =
                SubtitleCollection::from_transcript(output_json.to_path_buf(), &transcript, &self.config.subtitles)
                    .context("Failed to convert transcript")?;
            collection.write_to_srt(srt_path)?;
        }

        Ok(transcript)
    }

    /// Format a duration for log output
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
