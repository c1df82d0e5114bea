/*!
 * Segmenter: partitions the word stream into candidate subtitle segments
 * using silence gaps, speaker changes and sentence boundaries.
 */

use crate::app_config::SubtitleConfig;
use crate::segmentation::boundary::{
    ends_with_sentence_ender, is_safe_boundary, is_sentence_ender, visible_char_count,
};
use crate::segmentation::words::Word;

/// An ordered run of words forming one candidate or final subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a> {
    /// Start of the first word in ms
    pub start_ms: i64,

    /// Latest word end in ms
    pub end_ms: i64,

    /// First non-empty speaker label among the words
    pub speaker: Option<String>,

    /// Words in display order
    pub words: Vec<Word<'a>>,

    /// Whether the segment closes a sentence
    pub sentence_break: bool,

    /// Render a leading ellipsis
    pub prefix_ellipsis: bool,

    /// Render a trailing ellipsis
    pub suffix_ellipsis: bool,
}

impl<'a> Segment<'a> {
    /// Build a segment spanning `words`, or `None` when there are no words
    pub fn from_words(words: Vec<Word<'a>>, sentence_break: bool) -> Option<Self> {
        let start_ms = words.first()?.start_ms;
        let end_ms = words
            .iter()
            .map(|w| w.end_ms)
            .max()
            .unwrap_or(start_ms)
            .max(start_ms);
        let speaker = words.iter().find_map(|w| w.speaker()).map(str::to_string);

        Some(Self {
            start_ms,
            end_ms,
            speaker,
            words,
            sentence_break,
            prefix_ellipsis: false,
            suffix_ellipsis: false,
        })
    }

    /// Concatenated word text, trimmed
    pub fn text(&self) -> String {
        let joined: String = self.words.iter().map(|w| w.text.as_str()).collect();
        joined.trim().to_string()
    }

    /// Text with ellipsis markers applied
    pub fn display_text(&self) -> String {
        let mut text = self.text();
        if self.prefix_ellipsis {
            text.insert_str(0, super::boundary::ELLIPSIS);
        }
        if self.suffix_ellipsis {
            text.push_str(super::boundary::ELLIPSIS);
        }
        text
    }

    /// Duration in ms, never below 1
    pub fn duration_ms(&self) -> i64 {
        self.end_ms.saturating_sub(self.start_ms).max(1)
    }

    /// Non-whitespace characters per second
    pub fn reading_speed(&self) -> f64 {
        visible_char_count(&self.text()) as f64 / (self.duration_ms() as f64 / 1000.0)
    }
}

// Scan state while folding over the word stream
struct SegmentAccumulator<'a> {
    segments: Vec<Segment<'a>>,
    words: Vec<Word<'a>>,
    last_end: Option<i64>,
    speaker: Option<String>,
}

impl<'a> SegmentAccumulator<'a> {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            words: Vec::new(),
            last_end: None,
            speaker: None,
        }
    }

    fn push(&mut self, word: Word<'a>, config: &SubtitleConfig) {
        let word_speaker = word.speaker().map(str::to_string);

        if config.split_on_speaker && !self.words.is_empty() {
            if let (Some(current), Some(next)) = (&self.speaker, &word_speaker) {
                if current != next {
                    self.close(false);
                }
            }
        }

        if let (Some(prev), Some(last_end)) = (self.words.last(), self.last_end) {
            let gap = word.start_ms.saturating_sub(last_end);
            if config.gap_ms > 0 && gap > config.gap_ms && is_safe_boundary(&prev.text, &word.text) {
                self.close(false);
            }
        }

        let trimmed = word.text.trim();
        let mut chars = trimmed.chars();
        let is_lone_ender = matches!((chars.next(), chars.next()), (Some(c), None) if is_sentence_ender(c));
        let sentence_break = is_lone_ender || (config.segment_on_sentence && ends_with_sentence_ender(trimmed));

        self.last_end = Some(word.end_ms);
        if self.speaker.is_none() {
            self.speaker = word_speaker;
        }
        self.words.push(word);

        if sentence_break {
            self.close(true);
        }
    }

    fn close(&mut self, sentence_break: bool) {
        let words = std::mem::take(&mut self.words);
        self.last_end = None;
        self.speaker = None;

        if let Some(segment) = Segment::from_words(words, sentence_break) {
            // Whitespace-only runs never become cues
            if !segment.text().is_empty() {
                self.segments.push(segment);
            }
        }
    }

    fn finish(mut self) -> Vec<Segment<'a>> {
        self.close(false);
        self.segments
    }
}

/// Partition `words` into ordered, non-overlapping candidate segments
pub fn build_segments<'a>(words: Vec<Word<'a>>, config: &SubtitleConfig) -> Vec<Segment<'a>> {
    words
        .into_iter()
        .fold(SegmentAccumulator::new(), |mut acc, word| {
            acc.push(word, config);
            acc
        })
        .finish()
}
