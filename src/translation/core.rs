/*!
 * Subtitle translation through a chat language model.
 *
 * Entries are sent in chunks as numbered lines. A reply that cannot be
 * mapped back onto the chunk's sequence numbers is retried with a reminder,
 * then the chunk is halved until single entries remain. Timings and
 * sequence numbers never change; only the cue text does.
 */

use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::app_config::SubtitleConfig;
use crate::errors::TranslationError;
use crate::providers::{LanguageModel, TokenUsage};
use crate::subtitle_processor::SubtitleEntry;

use super::formatting::{
    entry_text, fallback_sequential_mapping, filter_block_by_indices, format_entries, format_entries_xml,
    parse_translated_lines, wrap_translated_text,
};
use super::prompts::{
    build_review_prompt, RetryReason, Stage, TranslationPromptBuilder, REVIEWER_SYSTEM_PROMPT,
    TRANSLATOR_SYSTEM_PROMPT,
};

/// Entries per request unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Retries of a chunk before it is halved
pub const MAX_TRANSLATION_RETRIES: usize = 2;

/// Token usage accumulated over a translation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Requests that reported usage
    pub calls: u64,

    /// Requests that reported usage, per pass
    pub per_stage: BTreeMap<Stage, u64>,
}

impl TranslationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one request's usage; requests without usage are not counted
    pub fn record(&mut self, stage: Stage, usage: Option<TokenUsage>) {
        let Some(usage) = usage else {
            return;
        };
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total_tokens;
        self.calls += 1;
        *self.per_stage.entry(stage).or_insert(0) += 1;
    }

    /// One-line usage report
    pub fn summary(&self) -> String {
        format!(
            "LLM usage: prompts={} completion={} total={} tokens across {} calls",
            self.prompt_tokens, self.completion_tokens, self.total_tokens, self.calls
        )
    }
}

/// How many passes a translation run makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationPasses {
    /// One draft pass
    Draft,
    /// Draft, one review of the whole draft, then a refine pass
    DraftReviewRefine,
}

impl TranslationPasses {
    /// 1 or 3 passes; other counts are not supported
    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            1 => Some(Self::Draft),
            3 => Some(Self::DraftReviewRefine),
            _ => None,
        }
    }
}

// Per-pass context shared by every chunk of that pass
#[derive(Debug, Clone, Copy)]
struct ChunkRequest<'a> {
    stage: Stage,
    draft_block: Option<&'a str>,
    review_notes: Option<&'a str>,
    full_context: Option<&'a str>,
}

/// Translates subtitle entries with a language model
#[derive(Debug)]
pub struct Translator<M: LanguageModel> {
    model: M,
    target_language: String,
    layout: SubtitleConfig,
    chunk_size: usize,
    max_retries: usize,
}

impl<M: LanguageModel> Translator<M> {
    /// Translator into `target_language`, re-wrapping text with `layout`
    pub fn new(model: M, target_language: impl Into<String>, layout: SubtitleConfig) -> Self {
        Self {
            model,
            target_language: target_language.into(),
            layout,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: MAX_TRANSLATION_RETRIES,
        }
    }

    /// Entries per request; 0 sends all entries at once
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Run the requested passes over `entries`
    pub async fn translate(
        &self,
        entries: &[SubtitleEntry],
        passes: TranslationPasses,
        stats: &mut TranslationStats,
    ) -> Result<Vec<SubtitleEntry>, TranslationError> {
        match passes {
            TranslationPasses::Draft => self.translate_entries(entries, stats).await,
            TranslationPasses::DraftReviewRefine => self.translate_with_review(entries, stats).await,
        }
    }

    /// Single draft pass
    pub async fn translate_entries(
        &self,
        entries: &[SubtitleEntry],
        stats: &mut TranslationStats,
    ) -> Result<Vec<SubtitleEntry>, TranslationError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let full_context = format_entries_xml(entries);
        let request = ChunkRequest {
            stage: Stage::Draft,
            draft_block: None,
            review_notes: None,
            full_context: Some(&full_context),
        };
        self.run_pass(entries, request, stats).await
    }

    /// Draft pass, one review of the whole draft, then a refine pass
    pub async fn translate_with_review(
        &self,
        entries: &[SubtitleEntry],
        stats: &mut TranslationStats,
    ) -> Result<Vec<SubtitleEntry>, TranslationError> {
        let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
            return Ok(Vec::new());
        };

        let source_plain = format_entries(entries);
        let full_context = format_entries_xml(entries);

        let draft_request = ChunkRequest {
            stage: Stage::Draft,
            draft_block: None,
            review_notes: None,
            full_context: Some(&full_context),
        };
        let draft = self.run_pass(entries, draft_request, stats).await?;
        let draft_plain = format_entries(&draft);
        let draft_xml = format_entries_xml(&draft);

        let review_prompt = build_review_prompt(
            &self.target_language,
            &source_plain,
            &draft_plain,
            first.seq_num,
            last.seq_num,
            Some(&full_context),
        );
        let review = self.model.complete(REVIEWER_SYSTEM_PROMPT, &review_prompt).await?;
        stats.record(Stage::Review, review.usage);
        info!(
            "Translation review received {} characters for lines {}-{}",
            review.text.chars().count(),
            first.seq_num,
            last.seq_num
        );

        let refine_request = ChunkRequest {
            stage: Stage::Refine,
            draft_block: Some(&draft_xml),
            review_notes: Some(review.text.as_str()).filter(|notes| !notes.trim().is_empty()),
            full_context: Some(&full_context),
        };
        self.run_pass(entries, refine_request, stats).await
    }

    async fn run_pass(
        &self,
        entries: &[SubtitleEntry],
        request: ChunkRequest<'_>,
        stats: &mut TranslationStats,
    ) -> Result<Vec<SubtitleEntry>, TranslationError> {
        let chunk_size = if self.chunk_size == 0 { entries.len().max(1) } else { self.chunk_size };

        let mut translated = Vec::with_capacity(entries.len());
        for chunk in entries.chunks(chunk_size) {
            translated.extend(self.translate_chunk(chunk, request, stats).await?);
        }
        Ok(translated)
    }

    async fn translate_chunk(
        &self,
        chunk: &[SubtitleEntry],
        request: ChunkRequest<'_>,
        stats: &mut TranslationStats,
    ) -> Result<Vec<SubtitleEntry>, TranslationError> {
        // Entries without text pass through untouched
        let expected: Vec<usize> = chunk
            .iter()
            .filter(|entry| !entry_text(entry).is_empty())
            .map(|entry| entry.seq_num)
            .collect();
        let (Some(&first), Some(&last)) = (expected.first(), expected.last()) else {
            return Ok(chunk.to_vec());
        };

        let numbered_block = format_entries(chunk);
        let draft_block = filter_block_by_indices(request.draft_block, &expected);
        let mut attempt = 0;
        let mut reason: Option<RetryReason> = None;

        loop {
            debug!(
                "Translation {} pass requesting lines {}-{} (attempt {})",
                request.stage,
                first,
                last,
                attempt + 1
            );

            let prompt = TranslationPromptBuilder::new(&self.target_language, &numbered_block, &expected)
                .stage(request.stage)
                .retry(if attempt > 0 { Some(reason.unwrap_or(RetryReason::Format)) } else { None })
                .draft_block(draft_block.as_deref())
                .review_notes(request.review_notes)
                .full_context(request.full_context)
                .build();
            let completion = self.model.complete(TRANSLATOR_SYSTEM_PROMPT, &prompt).await?;
            stats.record(request.stage, completion.usage);
            let reply = completion.text;

            let mapping = match parse_translated_lines(&reply, &expected) {
                Ok(mapping) => Some(mapping),
                Err(err) => {
                    warn!(
                        "Translation {} pass numbering mismatch for lines {}-{}: {}",
                        request.stage, first, last, err
                    );
                    let fallback = fallback_sequential_mapping(&reply, &expected);
                    if fallback.is_some() {
                        info!(
                            "Translation {} pass using sequential mapping for lines {}-{}",
                            request.stage, first, last
                        );
                    } else {
                        let reply_lines = reply.lines().filter(|line| !line.trim().is_empty()).count();
                        reason = Some(if reply_lines == expected.len() {
                            RetryReason::NumberingMismatch
                        } else {
                            RetryReason::CountMismatch
                        });
                    }
                    fallback
                }
            };

            if let Some(mapping) = mapping {
                match check_mapping(&mapping, &expected) {
                    Ok(()) => return Ok(self.apply_mapping(chunk, &mapping)),
                    Err(rejected) => {
                        if rejected == RetryReason::MissingText {
                            warn!(
                                "Translation {} pass produced empty text for lines {}-{}",
                                request.stage, first, last
                            );
                        }
                        reason = Some(rejected);
                    }
                }
            }

            let why = reason.unwrap_or(RetryReason::Format);
            if attempt < self.max_retries {
                info!(
                    "Translation {} pass retrying lines {}-{} ({}/{} retries) due to {}",
                    request.stage,
                    first,
                    last,
                    attempt + 1,
                    self.max_retries,
                    why
                );
                attempt += 1;
                continue;
            }

            if chunk.len() > 1 {
                info!(
                    "Translation {} pass splitting lines {}-{} after retries due to {}",
                    request.stage, first, last, why
                );
                let mid = chunk.len() / 2;
                let mut left = Box::pin(self.translate_chunk(&chunk[..mid], request, stats)).await?;
                let right = Box::pin(self.translate_chunk(&chunk[mid..], request, stats)).await?;
                left.extend(right);
                return Ok(left);
            }

            let stripped = reply.trim();
            if stripped.is_empty() {
                return Err(TranslationError::EmptyResponse);
            }
            warn!(
                "Translation {} pass fell back to single-line result for line {}",
                request.stage, first
            );
            let entry = &chunk[0];
            return Ok(vec![SubtitleEntry::new(
                entry.seq_num,
                entry.start_time_ms,
                entry.end_time_ms,
                wrap_translated_text(stripped, &self.layout),
            )]);
        }
    }

    fn apply_mapping(&self, chunk: &[SubtitleEntry], mapping: &BTreeMap<usize, String>) -> Vec<SubtitleEntry> {
        chunk
            .iter()
            .map(|entry| match mapping.get(&entry.seq_num) {
                Some(text) if !entry_text(entry).is_empty() => SubtitleEntry::new(
                    entry.seq_num,
                    entry.start_time_ms,
                    entry.end_time_ms,
                    wrap_translated_text(text, &self.layout),
                ),
                _ => entry.clone(),
            })
            .collect()
    }
}

// Every expected number present with non-blank text
fn check_mapping(mapping: &BTreeMap<usize, String>, expected: &[usize]) -> Result<(), RetryReason> {
    if expected.iter().any(|index| !mapping.contains_key(index)) {
        return Err(RetryReason::NumberingMismatch);
    }
    if expected
        .iter()
        .any(|index| mapping.get(index).is_some_and(|text| text.trim().is_empty()))
    {
        return Err(RetryReason::MissingText);
    }
    Ok(())
}
