/*!
 * Prompt templates for the draft, review and refine passes.
 */

use std::fmt;

/// System prompt for the draft and refine passes
pub const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a senior audiovisual (AVT) subtitle localizer. \
Produce fluent, idiomatic, speakable dialogue in the requested target language, preserving tone, \
register, sarcasm, humor, and intensity (including slang/profanity). Prefer natural phrasing over \
literal calques. Keep character voice consistent within this batch. Preserve proper names, brands, \
acronyms, and in-universe terms (transliterate only if widely conventional). Keep numbers/units; \
adapt punctuation to target-language norms. Be concise and oral: favor contractions and colloquial \
syntax where natural; avoid bookish phrasing. Output policy (strict): one line per input line, \
exactly '<number> <translated text>'. Keep the exact input numbering; do not renumber, insert, \
merge, or reorder lines. No extra lines or code fences.";

/// System prompt for the review pass
pub const REVIEWER_SYSTEM_PROMPT: &str = "You are a senior subtitle editor auditing a translation \
for quality. Flag literal calques, incorrect slang, register issues, tone mismatches, and \
inconsistent second-person usage. Identify misinterpreted cultural or clothing terms and missing \
intensity.";

/// Pass of the translation workflow a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Draft,
    Review,
    Refine,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Draft => "draft",
            Stage::Review => "review",
            Stage::Refine => "refine",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the previous reply for a chunk was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    CountMismatch,
    NumberingMismatch,
    MissingText,
    Format,
}

impl RetryReason {
    /// Wording used in the retry reminder
    pub fn describe(&self) -> &'static str {
        match self {
            RetryReason::CountMismatch => "the number of returned lines did not match the input",
            RetryReason::NumberingMismatch => "some line numbers did not align with the input",
            RetryReason::MissingText => "one or more lines were empty",
            RetryReason::Format => "the required format was not respected",
        }
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetryReason::CountMismatch => "count mismatch",
            RetryReason::NumberingMismatch => "numbering mismatch",
            RetryReason::MissingText => "missing text",
            RetryReason::Format => "format mismatch",
        };
        f.write_str(name)
    }
}

/// Builder for the user prompt of a draft or refine request
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder<'a> {
    target_language: &'a str,
    numbered_block: &'a str,
    first_index: usize,
    last_index: usize,
    expected_count: usize,
    stage: Stage,
    retry: Option<RetryReason>,
    draft_block: Option<&'a str>,
    review_notes: Option<&'a str>,
    full_context: Option<&'a str>,
}

impl<'a> TranslationPromptBuilder<'a> {
    pub fn new(target_language: &'a str, numbered_block: &'a str, indices: &[usize]) -> Self {
        Self {
            target_language,
            numbered_block,
            first_index: indices.first().copied().unwrap_or_default(),
            last_index: indices.last().copied().unwrap_or_default(),
            expected_count: indices.len(),
            stage: Stage::Draft,
            retry: None,
            draft_block: None,
            review_notes: None,
            full_context: None,
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Remind the model why its last reply was rejected
    pub fn retry(mut self, reason: Option<RetryReason>) -> Self {
        self.retry = reason;
        self
    }

    pub fn draft_block(mut self, block: Option<&'a str>) -> Self {
        self.draft_block = block;
        self
    }

    pub fn review_notes(mut self, notes: Option<&'a str>) -> Self {
        self.review_notes = notes;
        self
    }

    pub fn full_context(mut self, context: Option<&'a str>) -> Self {
        self.full_context = context;
        self
    }

    pub fn build(&self) -> String {
        let mut prompt = format!(
            "Translate the numbered subtitle lines into {language}.\n\
             Constraints:\n\
             - Keep the exact numbering from input; do not renumber or insert new numbers.\n\
             - Output must be valid XML in the following form: <subtitles><line index=\"N\">text</line>...</subtitles>.\n\
             - Provide exactly one <line> element per input line.\n\
             - Keep it concise, idiomatic, and speakable; preserve tone, register, slang, and intensity.\n\
             - Do not add commentary, explanations, or metadata.\n\n\
             Example output:\n\
             <subtitles>\n  <line index=\"123\">Texto</line>\n  <line index=\"124\">Mais texto</line>\n</subtitles>\n\n\
             Context: First input number = {first}; last input number = {last}.\n\
             Treat this batch as a contiguous excerpt; keep voice/register consistent across lines.\n\
             The very first output line must start with '{first} '. The final output line must start \
             with '{last} '. Do NOT restart numbering at 1 or omit any line numbers.",
            language = self.target_language,
            first = self.first_index,
            last = self.last_index,
        );

        if self.stage == Stage::Refine {
            prompt.push_str(
                "\n\nYou are refining an existing translation. Apply the review notes to fix issues \
                 while preserving lines that already sound natural. Ensure the final XML obeys the \
                 <subtitles><line index=\"...\">...</line></subtitles> structure.",
            );
        }

        prompt.push_str("\n\nInput numbered lines:\n");
        prompt.push_str(self.numbered_block);

        if let Some(reason) = self.retry {
            prompt.push_str(&format!(
                "\n\nReminder: You must output exactly {} lines. Each line must start with the \
                 original number. The previous attempt failed because {}.",
                self.expected_count,
                reason.describe()
            ));
        }
        if let Some(block) = self.draft_block {
            prompt.push_str("\n\nExisting translation:\n");
            prompt.push_str(block);
        }
        if let Some(notes) = self.review_notes {
            prompt.push_str("\n\nReview notes to address:\n");
            prompt.push_str(notes);
        }
        if let Some(context) = self.full_context {
            prompt.push_str("\n\nFull transcript context (do not renumber; for reference only):\n");
            prompt.push_str(context);
        }
        prompt
    }
}

/// User prompt for the review pass
pub fn build_review_prompt(
    target_language: &str,
    source_block: &str,
    draft_block: &str,
    first_index: usize,
    last_index: usize,
    full_context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Review the translation into {target_language} and report problems.\n\
         Provide two sections strictly in this order:\n\
         ISSUES:\n\
         - Bullet list of notable problems (e.g., literal calque, wrong slang, clinical word, \
         wrong intensity, inconsistent address).\n\
         SUGGESTED FIXES:\n\
         - Bullet list with '<line number> → concise correction or guidance'.\n\
         Keep it concise but specific.\n\n\
         Source segment (lines {first_index}-{last_index}):\n{source_block}\n\n\
         Draft translation:\n{draft_block}\n"
    );
    if let Some(context) = full_context {
        prompt.push_str("\nFull transcript context (reference only):\n");
        prompt.push_str(context);
        prompt.push('\n');
    }
    prompt
}
