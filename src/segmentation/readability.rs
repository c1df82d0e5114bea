/*!
 * Readability enforcement over candidate segments.
 *
 * The split phase breaks any multi-word segment that is too long, too fast
 * to read or holds too many characters, choosing the safe word boundary
 * closest to the character midpoint. The merge phase then folds segments
 * shorter than the minimum duration into their successor until a pass
 * makes no change.
 */

use std::collections::VecDeque;

use log::debug;

use crate::app_config::SubtitleConfig;
use crate::segmentation::boundary::{char_len, is_safe_boundary, is_sentence_ender};
use crate::segmentation::segmenter::Segment;
use crate::segmentation::words::Word;

/// Budgets a segment must satisfy to be emitted without splitting
#[derive(Debug, Clone, PartialEq)]
pub struct ReadabilityLimits {
    pub max_cps: f64,
    pub min_dur_ms: i64,
    pub max_dur_ms: i64,
    pub max_chars: Option<usize>,
    pub use_ellipses: bool,
    pub preserve_sentence_breaks: bool,
}

impl From<&SubtitleConfig> for ReadabilityLimits {
    fn from(config: &SubtitleConfig) -> Self {
        Self {
            max_cps: config.max_cps,
            min_dur_ms: config.min_dur_ms,
            max_dur_ms: config.max_dur_ms,
            max_chars: Some(config.max_total_chars()),
            use_ellipses: config.ellipses,
            preserve_sentence_breaks: config.segment_on_sentence,
        }
    }
}

impl ReadabilityLimits {
    /// Whether `segment` breaks any budget
    pub fn is_violated_by(&self, segment: &Segment<'_>) -> bool {
        segment.duration_ms() > self.max_dur_ms
            || segment.reading_speed() > self.max_cps
            || self
                .max_chars
                .is_some_and(|max| char_len(&segment.text()) > max)
    }
}

/// Split over-budget segments, then merge short ones
pub fn enforce_readability<'a>(
    segments: Vec<Segment<'a>>,
    limits: &ReadabilityLimits,
) -> Vec<Segment<'a>> {
    let before = segments.len();
    let split = split_segments(segments, limits);
    let after_split = split.len();
    let merged = merge_short_segments(split, limits);

    debug!(
        "Readability: {} segments -> {} after split -> {} after merge",
        before,
        after_split,
        merged.len()
    );
    merged
}

/// Split every segment that violates a budget until it fits or is a single word
pub fn split_segments<'a>(segments: Vec<Segment<'a>>, limits: &ReadabilityLimits) -> Vec<Segment<'a>> {
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        // Children are pushed to the front so output order follows word order
        let mut pending = VecDeque::from([segment]);
        while let Some(current) = pending.pop_front() {
            if current.text().is_empty() {
                continue;
            }
            if current.words.len() <= 1 || !limits.is_violated_by(&current) {
                out.push(current);
                continue;
            }

            let (left, right) = split_at_best_boundary(current, limits.use_ellipses);
            pending.push_front(right);
            pending.push_front(left);
        }
    }

    out
}

fn split_at_best_boundary<'a>(segment: Segment<'a>, use_ellipses: bool) -> (Segment<'a>, Segment<'a>) {
    let idx = find_split_index(&segment.words);
    let Segment {
        start_ms,
        end_ms,
        mut words,
        sentence_break,
        prefix_ellipsis,
        suffix_ellipsis,
        ..
    } = segment;
    let right_words = words.split_off(idx);
    let mid_sentence = words.last().is_some_and(|w| !ends_with_ender(w));

    let mut left = child_segment(words, false, start_ms);
    let mut right = child_segment(right_words, sentence_break, end_ms);

    left.prefix_ellipsis = prefix_ellipsis;
    right.suffix_ellipsis = suffix_ellipsis;
    if use_ellipses && mid_sentence {
        left.suffix_ellipsis = true;
        right.prefix_ellipsis = true;
    }

    (left, right)
}

// `find_split_index` keeps both halves non-empty, the fallback is never used
fn child_segment<'a>(words: Vec<Word<'a>>, sentence_break: bool, fallback_ms: i64) -> Segment<'a> {
    Segment::from_words(words, sentence_break).unwrap_or(Segment {
        start_ms: fallback_ms,
        end_ms: fallback_ms,
        speaker: None,
        words: Vec::new(),
        sentence_break,
        prefix_ellipsis: false,
        suffix_ellipsis: false,
    })
}

fn is_safe_at(words: &[Word<'_>], k: usize) -> bool {
    if k == 0 || k >= words.len() {
        return true;
    }
    is_safe_boundary(&words[k - 1].text, &words[k].text)
}

fn adjust_to_safe(words: &[Word<'_>], k: usize) -> usize {
    if is_safe_at(words, k) {
        return k;
    }
    let n = words.len();
    if let Some(j) = (k + 1..n).find(|&j| is_safe_at(words, j)) {
        return j;
    }
    if let Some(j) = (1..k).rev().find(|&j| is_safe_at(words, j)) {
        return j;
    }
    k
}

fn ends_with_ender(word: &Word<'_>) -> bool {
    word.text.chars().last().is_some_and(is_sentence_ender)
}

/// Index of the first word of the right half; always in `1..words.len()`
/// for two or more words
pub fn find_split_index(words: &[Word<'_>]) -> usize {
    let n = words.len();
    if n <= 1 {
        return 1;
    }

    let total: usize = words.iter().map(|w| char_len(&w.text)).sum();
    let mid_chars = total / 2;

    let mut best: Option<(usize, usize)> = None;
    let mut cumulative = 0;
    for k in 1..n {
        cumulative += char_len(&words[k - 1].text);
        if is_safe_boundary(&words[k - 1].text, &words[k].text) {
            let distance = cumulative.abs_diff(mid_chars);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((k, distance));
            }
        }
    }
    if let Some((k, _)) = best {
        return adjust_to_safe(words, k);
    }

    let mid = n / 2;
    if let Some(k) = (1..=mid).rev().find(|&k| ends_with_ender(&words[k - 1])) {
        return adjust_to_safe(words, k);
    }
    if let Some(k) = (mid + 1..n).find(|&k| ends_with_ender(&words[k - 1])) {
        return adjust_to_safe(words, k);
    }

    adjust_to_safe(words, mid)
}

/// Merge segments shorter than the minimum duration into their successor
/// until a full pass merges nothing
pub fn merge_short_segments<'a>(segments: Vec<Segment<'a>>, limits: &ReadabilityLimits) -> Vec<Segment<'a>> {
    let mut current = segments;

    loop {
        let mut changed = false;
        let mut merged = Vec::with_capacity(current.len());
        let mut iter = current.into_iter().peekable();

        while let Some(segment) = iter.next() {
            let is_short = segment.end_ms.saturating_sub(segment.start_ms) < limits.min_dur_ms;
            let keeps_break = limits.preserve_sentence_breaks && segment.sentence_break;

            let fits = iter
                .peek()
                .is_some_and(|next| next.end_ms.saturating_sub(segment.start_ms) <= limits.max_dur_ms);

            if is_short && !keeps_break && fits {
                if let Some(next) = iter.next() {
                    merged.push(merge_pair(segment, next));
                    changed = true;
                    continue;
                }
            }
            merged.push(segment);
        }

        current = merged;
        if !changed {
            return current;
        }
    }
}

fn merge_pair<'a>(first: Segment<'a>, second: Segment<'a>) -> Segment<'a> {
    let mut words = first.words;
    words.extend(second.words);

    Segment {
        start_ms: first.start_ms,
        end_ms: second.end_ms.max(first.start_ms),
        speaker: first.speaker.or(second.speaker),
        words,
        sentence_break: second.sentence_break,
        prefix_ellipsis: first.prefix_ellipsis,
        suffix_ellipsis: second.suffix_ellipsis,
    }
}
