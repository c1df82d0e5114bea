/*!
 * Segmentation engine: recognition tokens to readable subtitle segments.
 *
 * Data flows strictly through these stages:
 * - `words`: token fragments merged into words
 * - `segmenter`: words grouped by silence, speaker and sentence boundaries
 * - `readability`: over-budget segments split, short ones merged
 * - `wrap`: final segment text laid out into lines
 *
 * `boundary` holds the punctuation and safe-boundary rules they share.
 */

pub mod boundary;
pub mod readability;
pub mod segmenter;
pub mod words;
pub mod wrap;

use log::debug;

use crate::app_config::SubtitleConfig;
use crate::transcript::Token;

pub use readability::{enforce_readability, ReadabilityLimits};
pub use segmenter::{build_segments, Segment};
pub use words::{assemble_words, Word};
pub use wrap::wrap_segment;

/// Run words, segmentation and readability enforcement over `tokens`
pub fn tokens_to_segments<'a>(tokens: &'a [Token], config: &SubtitleConfig) -> Vec<Segment<'a>> {
    let words = assemble_words(tokens);
    debug!("Assembled {} words from {} tokens", words.len(), tokens.len());

    let segments = build_segments(words, config);
    if segments.is_empty() {
        return segments;
    }
    debug!("Built {} candidate segments", segments.len());

    enforce_readability(segments, &ReadabilityLimits::from(config))
}
