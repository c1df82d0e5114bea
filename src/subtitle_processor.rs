use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;

use crate::app_config::SubtitleConfig;
use crate::errors::SubtitleError;
use crate::segmentation::{tokens_to_segments, wrap_segment, Segment};
use crate::transcript::{extract_tokens, load_transcript};

// @module: Subtitle cue rendering and SRT output

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number (1-based)
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: i64,

    // @field: End time in ms
    pub end_time_ms: i64,

    // @field: Display lines
    pub lines: Vec<String>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: i64, end_time_ms: i64, lines: Vec<String>) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            lines,
        }
    }

    /// Lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm),
    /// clamping negative values to zero
    pub fn format_timestamp(ms: i64) -> String {
        let ms = ms.max(0);
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Collection of rendered subtitle entries
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Transcript the cues were generated from
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Create an empty subtitle collection
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
        }
    }

    /// Number segments from 1 and lay out their text
    pub fn from_segments(source_file: PathBuf, segments: &[Segment<'_>], config: &SubtitleConfig) -> Self {
        let entries = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                SubtitleEntry::new(i + 1, segment.start_ms, segment.end_ms, wrap_segment(segment, config))
            })
            .collect();

        SubtitleCollection { source_file, entries }
    }

    /// Build cues from an in-memory transcript value
    pub fn from_transcript(
        source_file: PathBuf,
        transcript: &Value,
        config: &SubtitleConfig,
    ) -> Result<Self, SubtitleError> {
        let tokens = extract_tokens(transcript)?;
        let segments = tokens_to_segments(&tokens, config);
        if segments.is_empty() {
            return Err(SubtitleError::NoSegments);
        }

        debug!("Rendering {} segments", segments.len());
        Ok(Self::from_segments(source_file, &segments, config))
    }

    /// Load a transcript JSON file and build cues from it
    pub fn from_transcript_file<P: AsRef<Path>>(path: P, config: &SubtitleConfig) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        info!("Loading transcript from {}", path.display());
        let transcript = load_transcript(path)?;
        Self::from_transcript(path.to_path_buf(), &transcript, config)
    }

    /// Render all entries as SRT text
    ///
    /// Blocks are separated by a blank line and the text ends with a
    /// single newline.
    pub fn to_srt_string(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        file.write_all(self.to_srt_string().as_bytes())
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;

        info!("Wrote {} subtitles to {}", self.entries.len(), path.display());
        Ok(())
    }
}
