/*!
 * Property and scenario tests for the segmentation engine
 */

use serde_json::json;

use sonioxsrt::app_config::SubtitleConfig;
use sonioxsrt::errors::SubtitleError;
use sonioxsrt::segmentation::readability::split_segments;
use sonioxsrt::segmentation::{
    assemble_words, build_segments, tokens_to_segments, wrap_segment, ReadabilityLimits, Segment,
};
use sonioxsrt::subtitle_processor::SubtitleCollection;
use sonioxsrt::transcript::{extract_tokens, Token};
use sonioxsrt::transcript_to_srt;

use crate::common;

const VOCABULARY: &[&str] = &[
    "Hello", " world", "lo", ",", " again", ".", " 日本", "語", "!", " yes", "?", " a",
    " thunderstorm", "-ish", " 東京", "です", "。", " okay", ";", " then", " ",
];

// Small deterministic generator so failures are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn random_tokens(seed: u64, count: usize) -> Vec<Token> {
    let mut rng = Lcg(seed);
    let mut cursor = 0i64;

    (0..count)
        .map(|_| {
            let text = VOCABULARY[rng.below(VOCABULARY.len() as u64) as usize];
            let gap = (if rng.below(8) == 0 { 1500 + rng.below(3000) } else { rng.below(200) }) as i64;
            let duration = 50 + rng.below(600) as i64;
            cursor += gap;
            let token = Token::new(text, cursor, cursor + duration);
            cursor += duration;
            match rng.below(3) {
                0 => token.with_speaker("1"),
                1 => token.with_speaker("2"),
                _ => token,
            }
        })
        .collect()
}

fn configs() -> Vec<SubtitleConfig> {
    vec![
        SubtitleConfig::default(),
        SubtitleConfig {
            segment_on_sentence: true,
            ellipses: true,
            ..Default::default()
        },
        SubtitleConfig {
            split_on_speaker: true,
            max_cpl: 16,
            max_cps: 12.0,
            ..Default::default()
        },
        SubtitleConfig {
            max_cpl: 12,
            max_lines: 3,
            max_dur_ms: 3000,
            line_split_delimiters: vec![',', '、', ';'],
            ..Default::default()
        },
    ]
}

// Whitespace-only tokens fold into the next word's single leading space
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn token_text(tokens: &[Token]) -> String {
    collapse_whitespace(&tokens.iter().map(|t| t.text.as_str()).collect::<String>())
}

fn segment_word_text(segments: &[Segment<'_>]) -> String {
    let joined: String = segments
        .iter()
        .flat_map(|s| s.words.iter().map(|w| w.text.as_str()))
        .collect();
    collapse_whitespace(&joined)
}

#[test]
fn test_assembleWords_withRandomStreams_shouldConserveTextAndTokens() {
    for seed in 1..40 {
        let tokens = random_tokens(seed, 60);

        let words = assemble_words(&tokens);

        let joined: String = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(collapse_whitespace(&joined), token_text(&tokens), "seed {}", seed);
        assert!(words.iter().all(|w| !w.text.trim().is_empty()), "seed {}", seed);
        let consumed: usize = words.iter().map(|w| w.tokens.len()).sum();
        assert_eq!(consumed, tokens.len(), "seed {}", seed);
    }
}

#[test]
fn test_tokensToSegments_withRandomStreams_shouldConserveWordsAndStayOrdered() {
    for config in configs() {
        for seed in 1..40 {
            let tokens = random_tokens(seed, 80);

            let segments = tokens_to_segments(&tokens, &config);

            assert_eq!(segment_word_text(&segments), token_text(&tokens), "seed {}", seed);
            for segment in &segments {
                assert!(segment.end_ms >= segment.start_ms, "seed {}", seed);
                assert!(!segment.text().is_empty(), "seed {}", seed);
            }
            for pair in segments.windows(2) {
                assert!(pair[0].start_ms <= pair[1].start_ms, "seed {}", seed);
            }
        }
    }
}

#[test]
fn test_splitSegments_withRandomStreams_shouldMeetBudgetsOrBeSingleWords() {
    for config in configs() {
        let limits = ReadabilityLimits::from(&config);
        for seed in 1..40 {
            let tokens = random_tokens(seed, 80);
            let candidates = build_segments(assemble_words(&tokens), &config);

            let split = split_segments(candidates, &limits);

            assert!(split.iter().all(|s| !s.text().is_empty()), "seed {}", seed);
            for segment in split.iter().filter(|s| s.words.len() >= 2) {
                assert!(segment.duration_ms() <= config.max_dur_ms, "seed {}", seed);
                assert!(segment.reading_speed() <= config.max_cps, "seed {}", seed);
                assert!(
                    segment.text().chars().count() <= config.max_total_chars(),
                    "seed {}",
                    seed
                );
            }
        }
    }
}

#[test]
fn test_tokensToSegments_withRandomStreams_shouldLeaveNoMergeablePair() {
    for config in configs() {
        for seed in 1..40 {
            let tokens = random_tokens(seed, 80);

            let segments = tokens_to_segments(&tokens, &config);

            for pair in segments.windows(2) {
                let (first, second) = (&pair[0], &pair[1]);
                let is_short = first.end_ms - first.start_ms < config.min_dur_ms;
                let keeps_break = config.segment_on_sentence && first.sentence_break;
                let fits = second.end_ms - first.start_ms <= config.max_dur_ms;
                assert!(!(is_short && !keeps_break && fits), "seed {}", seed);
            }
        }
    }
}

#[test]
fn test_wrapSegment_withRandomStreams_shouldRespectLineBounds() {
    for config in configs() {
        for seed in 1..40 {
            let tokens = random_tokens(seed, 80);

            for segment in tokens_to_segments(&tokens, &config) {
                let lines = wrap_segment(&segment, &config);

                assert!(!lines.is_empty() && lines.len() <= config.max_lines, "seed {}", seed);
                for line in &lines {
                    assert!(line.chars().count() <= config.max_cpl, "seed {} line {:?}", seed, line);
                }
            }
        }
    }
}

#[test]
fn test_render_withSameSegments_shouldBeByteIdentical() {
    let tokens = random_tokens(7, 120);
    let config = SubtitleConfig::default();
    let segments = tokens_to_segments(&tokens, &config);

    let first = SubtitleCollection::from_segments("a.json".into(), &segments, &config).to_srt_string();
    let second = SubtitleCollection::from_segments("a.json".into(), &segments, &config).to_srt_string();

    assert_eq!(first, second);
    assert!(first.ends_with('\n') && !first.ends_with("\n\n"));
}

#[test]
fn test_tokensToSegments_withGapAndShortFirstWord_shouldMergeIntoOneSegment() {
    let tokens = vec![Token::new("Hello", 0, 500), Token::new(" world", 2500, 3000)];

    let segments = tokens_to_segments(&tokens, &SubtitleConfig::default());

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text(), "Hello world");
    assert_eq!((segments[0].start_ms, segments[0].end_ms), (0, 3000));
}

#[test]
fn test_tokensToSegments_withGapAndNoMinimumDuration_shouldKeepTwoSegments() {
    let tokens = vec![Token::new("Hello", 0, 500), Token::new(" world", 2500, 3000)];
    let config = SubtitleConfig { min_dur_ms: 0, ..Default::default() };

    let segments = tokens_to_segments(&tokens, &config);

    let texts: Vec<String> = segments.iter().map(Segment::text).collect();
    assert_eq!(texts, vec!["Hello", "world"]);
}

#[test]
fn test_wrapSegment_withHundredCharacterRun_shouldHardCutIntoTwoLines() {
    let tokens = vec![Token::new("a".repeat(100), 0, 10_000)];
    let config = SubtitleConfig::default();

    let segments = tokens_to_segments(&tokens, &config);
    let lines = wrap_segment(&segments[0], &config);

    assert_eq!(segments.len(), 1);
    assert_eq!(lines, vec!["a".repeat(42), "a".repeat(42)]);
}

#[test]
fn test_tokensToSegments_withLongSentenceAndEllipses_shouldMarkContinuation() {
    let words = ["one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten."];
    let tokens = common::timed_words(&words, 1000);
    let config = SubtitleConfig { ellipses: true, ..Default::default() };

    let collection = SubtitleCollection::from_segments("t.json".into(), &tokens_to_segments(&tokens, &config), &config);

    assert_eq!(collection.entries.len(), 2);
    let first_last_line = collection.entries[0].lines.last().unwrap();
    let second_first_line = &collection.entries[1].lines[0];
    assert!(first_last_line.ends_with('…'), "{:?}", first_last_line);
    assert!(second_first_line.starts_with('…'), "{:?}", second_first_line);
    assert!(second_first_line.ends_with("ten.") || collection.entries[1].lines.last().unwrap().ends_with("ten."));
}

#[test]
fn test_transcriptToSrt_withWhitespaceLeadToken_shouldNotRenderEmptyCue() {
    let transcript = json!({"tokens": [
        {"text": " ", "start_ms": 0, "end_ms": 0},
        {"text": " bbbb", "start_ms": 0, "end_ms": 8000}
    ]});

    let srt = transcript_to_srt(&transcript, &SubtitleConfig::default()).unwrap();

    assert_eq!(srt, "1\n00:00:00,000 --> 00:00:08,000\nbbbb\n");
}

#[test]
fn test_tokensToSegments_withEmptyInput_shouldProduceNothing() {
    assert!(tokens_to_segments(&[], &SubtitleConfig::default()).is_empty());
    assert!(matches!(extract_tokens(&json!({"tokens": []})), Err(SubtitleError::NoTokens)));
}
