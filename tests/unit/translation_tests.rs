/*!
 * Tests for subtitle translation against a scripted language model
 */

use sonioxsrt::app_config::SubtitleConfig;
use sonioxsrt::errors::TranslationError;
use sonioxsrt::subtitle_processor::SubtitleEntry;
use sonioxsrt::translation::prompts::{REVIEWER_SYSTEM_PROMPT, TRANSLATOR_SYSTEM_PROMPT};
use sonioxsrt::translation::{Stage, TranslationPasses, TranslationStats, Translator};

use crate::common::mock_providers::MockLanguageModel;

fn entry(seq_num: usize, start_ms: i64, end_ms: i64, text: &str) -> SubtitleEntry {
    let lines = if text.is_empty() { Vec::new() } else { vec![text.to_string()] };
    SubtitleEntry::new(seq_num, start_ms, end_ms, lines)
}

fn all_lines(entries: &[SubtitleEntry]) -> Vec<String> {
    entries.iter().flat_map(|e| e.lines.clone()).collect()
}

fn translator(replies: &[&str]) -> Translator<MockLanguageModel> {
    Translator::new(MockLanguageModel::new(replies.iter().copied()), "Spanish", SubtitleConfig::default())
}

/// Test that an XML reply replaces text while keeping numbers and timings
#[tokio::test]
async fn test_translateEntries_withXmlReply_shouldKeepTimingAndNumbers() {
    let entries = vec![entry(1, 0, 1000, "Hello there."), entry(2, 1000, 2200, "General Kenobi!")];
    let translator = Translator::new(
        MockLanguageModel::new([
            "<subtitles><line index=\"1\">Hola.</line><line index=\"2\">¡General Kenobi!</line></subtitles>",
        ])
        .with_usage(30, 8),
        "Spanish",
        SubtitleConfig {
            max_cpl: 20,
            ..SubtitleConfig::default()
        },
    );
    let mut stats = TranslationStats::new();

    let translated = translator.translate(&entries, TranslationPasses::Draft, &mut stats).await.unwrap();

    assert_eq!(translated[0], SubtitleEntry::new(1, 0, 1000, vec!["Hola.".to_string()]));
    assert_eq!(translated[1], SubtitleEntry::new(2, 1000, 2200, vec!["¡General Kenobi!".to_string()]));

    let prompts = translator.model().prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].system, TRANSLATOR_SYSTEM_PROMPT);
    assert!(prompts[0].user.contains("1 Hello there.\n2 General Kenobi!"));
    assert!(prompts[0].user.contains("into Spanish"));
    assert_eq!(stats.summary(), "LLM usage: prompts=30 completion=8 total=38 tokens across 1 calls");
}

/// Test that a reply restarting at 1 is mapped onto the chunk's numbers
#[tokio::test]
async fn test_translateEntries_withRestartedNumbering_shouldRemap() {
    let entries = vec![entry(7, 0, 1000, "One"), entry(8, 1000, 2000, "Two")];
    let translator = translator(&["1 Uno\n2 Dos"]);
    let mut stats = TranslationStats::new();

    let translated = translator.translate_entries(&entries, &mut stats).await.unwrap();

    assert_eq!(translated.iter().map(|e| e.seq_num).collect::<Vec<_>>(), vec![7, 8]);
    assert_eq!(all_lines(&translated), vec!["Uno", "Dos"]);
    assert_eq!(translator.model().call_count(), 1);
}

/// Test that unnumbered replies with the right line count are paired by position
#[tokio::test]
async fn test_translateEntries_withUnnumberedReply_shouldPairSequentially() {
    let entries = vec![entry(3, 0, 1000, "One"), entry(4, 1000, 2000, "Two")];
    let translator = translator(&["Uno\nDos"]);

    let translated = translator
        .translate_entries(&entries, &mut TranslationStats::new())
        .await
        .unwrap();

    assert_eq!(all_lines(&translated), vec!["Uno", "Dos"]);
    assert_eq!(translator.model().call_count(), 1);
}

/// Test that an always-empty reply is an error after the retries
#[tokio::test]
async fn test_translateEntries_withEmptyReply_shouldFailAfterRetries() {
    let entries = vec![entry(5, 0, 1000, "Hello there.")];
    let translator = translator(&[""]);

    let result = translator.translate_entries(&entries, &mut TranslationStats::new()).await;

    assert!(matches!(result, Err(TranslationError::EmptyResponse)));
    assert_eq!(translator.model().call_count(), 3);
}

/// Test that a chunk is retried with a reminder and then halved
#[tokio::test]
async fn test_translateEntries_withPersistentBadReplies_shouldRetryThenHalve() {
    let entries = vec![entry(1, 0, 1000, "One"), entry(2, 1000, 2000, "Two")];
    let translator = translator(&[
        "I cannot do that",
        "I cannot do that",
        "I cannot do that",
        "<subtitles><line index=\"1\">Uno</line></subtitles>",
        "2 Dos",
    ]);

    let translated = translator
        .translate_entries(&entries, &mut TranslationStats::new())
        .await
        .unwrap();

    assert_eq!(all_lines(&translated), vec!["Uno", "Dos"]);
    let prompts = translator.model().prompts();
    assert_eq!(prompts.len(), 5);
    assert!(!prompts[0].user.contains("Reminder"));
    assert!(prompts[1].user.contains("Reminder: You must output exactly 2 lines."));
    assert!(prompts[1].user.contains("the number of returned lines did not match the input"));
    assert!(prompts[3].user.contains("Input numbered lines:\n1 One"));
    assert!(!prompts[3].user.contains("2 Two"));
    assert!(prompts[4].user.contains("Input numbered lines:\n2 Two"));
}

/// Test that blank lines in an otherwise valid reply trigger a retry
#[tokio::test]
async fn test_translateEntries_withBlankLine_shouldRetryWithMissingTextReason() {
    let entries = vec![entry(1, 0, 1000, "One"), entry(2, 1000, 2000, "Two")];
    let translator = translator(&[
        "<subtitles><line index=\"1\">Uno</line><line index=\"2\"></line></subtitles>",
        "1 Uno\n2 Dos",
    ]);

    let translated = translator
        .translate_entries(&entries, &mut TranslationStats::new())
        .await
        .unwrap();

    assert_eq!(all_lines(&translated), vec!["Uno", "Dos"]);
    let prompts = translator.model().prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].user.contains("one or more lines were empty"));
}

/// Test that entries are sent in chunks of the configured size
#[tokio::test]
async fn test_translateEntries_withChunkSize_shouldSplitRequests() {
    let entries = vec![entry(1, 0, 1000, "One"), entry(2, 1000, 2000, "Two"), entry(3, 2000, 3000, "Three")];
    let translator = translator(&[
        "<subtitles><line index=\"1\">Uno</line><line index=\"2\">Dos</line></subtitles>",
        "<subtitles><line index=\"3\">Tres</line></subtitles>",
    ])
    .with_chunk_size(2);

    let translated = translator
        .translate_entries(&entries, &mut TranslationStats::new())
        .await
        .unwrap();

    assert_eq!(all_lines(&translated), vec!["Uno", "Dos", "Tres"]);
    assert_eq!(translator.model().call_count(), 2);
}

/// Test that cues without text are not sent and come back unchanged
#[tokio::test]
async fn test_translateEntries_withTextlessCue_shouldPassItThrough() {
    let entries = vec![entry(1, 0, 1000, "Hi"), entry(2, 1000, 2000, "")];
    let translator = translator(&["1 Hola"]);

    let translated = translator
        .translate_entries(&entries, &mut TranslationStats::new())
        .await
        .unwrap();

    assert_eq!(translated[0].lines, vec!["Hola"]);
    assert_eq!(translated[1], entries[1]);
    assert!(!translator.model().prompts()[0].user.contains("Input numbered lines:\n1 Hi\n2"));
}

/// Test that long translations are re-wrapped to the layout
#[tokio::test]
async fn test_translateEntries_withLongReply_shouldRewrapLines() {
    let entries = vec![entry(1, 0, 3000, "Good morning everyone")];
    let translator = Translator::new(
        MockLanguageModel::new(["1 Buenos días a todos"]),
        "Spanish",
        SubtitleConfig {
            max_cpl: 12,
            ..SubtitleConfig::default()
        },
    );

    let translated = translator
        .translate_entries(&entries, &mut TranslationStats::new())
        .await
        .unwrap();

    assert_eq!(translated[0].lines, vec!["Buenos días", "a todos"]);
}

/// Test the draft, review and refine workflow
#[tokio::test]
async fn test_translateWithReview_shouldRunThreePassesAndApplyRefinement() {
    let entries = vec![entry(1, 0, 1000, "Hey."), entry(2, 1000, 2200, "Move on.")];
    let translator = Translator::new(
        MockLanguageModel::new([
            "<subtitles><line index=\"1\">Oi.</line><line index=\"2\">Vai andando.</line></subtitles>",
            "ISSUES:\n- 2 -> sounds too literal\nSUGGESTED FIXES:\n- 2 -> Use 'Cai fora.'",
            "<subtitles><line index=\"1\">Oi.</line><line index=\"2\">Cai fora.</line></subtitles>",
        ])
        .with_usage(100, 20),
        "Portuguese",
        SubtitleConfig::default(),
    );
    let mut stats = TranslationStats::new();

    let translated = translator
        .translate(&entries, TranslationPasses::DraftReviewRefine, &mut stats)
        .await
        .unwrap();

    assert_eq!(all_lines(&translated), vec!["Oi.", "Cai fora."]);

    let prompts = translator.model().prompts();
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[1].system, REVIEWER_SYSTEM_PROMPT);
    assert!(prompts[1].user.contains("ISSUES"));
    assert!(prompts[1].user.contains("Draft translation:\n1 Oi.\n2 Vai andando."));
    assert!(prompts[2].user.contains("You are refining an existing translation."));
    assert!(prompts[2].user.contains("Existing translation:\n<subtitles>"));
    assert!(prompts[2].user.contains("Review notes to address:\nISSUES:"));

    assert_eq!(stats.calls, 3);
    assert_eq!(stats.total_tokens, 360);
    assert_eq!(stats.per_stage.get(&Stage::Draft), Some(&1));
    assert_eq!(stats.per_stage.get(&Stage::Review), Some(&1));
    assert_eq!(stats.per_stage.get(&Stage::Refine), Some(&1));
}

/// Test that nothing is requested for an empty cue list
#[tokio::test]
async fn test_translate_withNoEntries_shouldNotCallModel() {
    let translator = translator(&["unused"]);

    for passes in [TranslationPasses::Draft, TranslationPasses::DraftReviewRefine] {
        let translated = translator.translate(&[], passes, &mut TranslationStats::new()).await.unwrap();
        assert!(translated.is_empty());
    }
    assert_eq!(translator.model().call_count(), 0);
}
