/*!
 * Word assembly: merges sub-word recognition tokens into legible words.
 *
 * A token starting with whitespace opens a new word, punctuation-only
 * tokens attach to the open word, and CJK text is broken wherever a new
 * token starts with an ideograph while the open word already holds one.
 * Whitespace-only tokens never form a word of their own: they are carried
 * into the next word as its leading space.
 */

use crate::segmentation::boundary::{
    contains_cjk, is_cjk, is_minor_breaker, is_punctuation, is_sentence_ender,
};
use crate::transcript::Token;

/// A run of tokens forming one orthographic unit
#[derive(Debug, Clone, PartialEq)]
pub struct Word<'a> {
    /// Merged text, with a single leading space if the run started with whitespace
    pub text: String,

    /// Earliest member token start in ms
    pub start_ms: i64,

    /// Latest member token end in ms
    pub end_ms: i64,

    /// Member tokens, in order
    pub tokens: Vec<&'a Token>,
}

impl<'a> Word<'a> {
    /// Whether the word carries a leading space marker
    pub fn has_leading_space(&self) -> bool {
        self.text.starts_with(' ')
    }

    /// First non-empty speaker label of the member tokens
    pub fn speaker(&self) -> Option<&'a str> {
        self.tokens
            .iter()
            .filter_map(|t| t.speaker.as_deref())
            .find(|s| !s.is_empty())
    }
}

// Scan state while folding over the token stream
#[derive(Default)]
struct WordAccumulator<'a> {
    words: Vec<Word<'a>>,
    tokens: Vec<&'a Token>,
    text: String,
    prefix_space: bool,
    start: Option<i64>,
    end: Option<i64>,
}

impl<'a> WordAccumulator<'a> {
    fn is_open(&self) -> bool {
        !self.tokens.is_empty()
    }

    fn push(&mut self, token: &'a Token) {
        let raw = token.text.as_str();
        if raw.is_empty() {
            return;
        }

        let starts_space = raw.starts_with(char::is_whitespace);
        let clean = raw.trim_start();

        if clean.is_empty() {
            self.flush();
            self.prefix_space = true;
            self.tokens.push(token);
            return;
        }

        if starts_space {
            self.flush();
            self.prefix_space = true;
        } else if !(is_punctuation(clean) && self.is_open()) {
            let starts_cjk = clean.chars().next().is_some_and(is_cjk);
            if starts_cjk && contains_cjk(&self.text) {
                self.flush();
            }
        }

        self.add(token, clean);

        let mut chars = clean.chars();
        let single_cjk = matches!((chars.next(), chars.next()), (Some(c), None) if is_cjk(c));
        let ends_break = clean
            .chars()
            .last()
            .is_some_and(|c| is_sentence_ender(c) || is_minor_breaker(c));
        if ends_break || single_cjk {
            self.flush();
        }
    }

    fn add(&mut self, token: &'a Token, text: &str) {
        self.tokens.push(token);
        self.text.push_str(text);
        if let Some(start) = token.start_ms {
            self.start = Some(self.start.map_or(start, |s| s.min(start)));
        }
        if let Some(end) = token.end_ms {
            self.end = Some(self.end.map_or(end, |e| e.max(end)));
        }
    }

    fn flush(&mut self) {
        // Pending whitespace tokens wait for the next visible text
        if self.tokens.is_empty() || self.text.is_empty() {
            return;
        }

        // Untimed tokens continue from where the previous word stopped
        let fallback = self.words.last().map_or(0, |w| w.end_ms);
        let start_ms = self.start.unwrap_or(fallback);
        let end_ms = self.end.unwrap_or(start_ms).max(start_ms);

        let mut text = String::with_capacity(self.text.len() + 1);
        if self.prefix_space {
            text.push(' ');
        }
        text.push_str(&self.text);

        self.words.push(Word {
            text,
            start_ms,
            end_ms,
            tokens: std::mem::take(&mut self.tokens),
        });
        self.text.clear();
        self.prefix_space = false;
        self.start = None;
        self.end = None;
    }

    fn finish(mut self) -> Vec<Word<'a>> {
        self.flush();
        if let Some(last) = self.words.last_mut() {
            last.tokens.append(&mut self.tokens);
        }
        if let Some(first) = self.words.first_mut() {
            let trimmed = first.text.trim_start().len();
            let cut = first.text.len() - trimmed;
            first.text.drain(..cut);
        }
        self.words
    }
}

/// Group tokens into words, covering every token exactly once and in order
pub fn assemble_words(tokens: &[Token]) -> Vec<Word<'_>> {
    tokens
        .iter()
        .fold(WordAccumulator::default(), |mut acc, token| {
            acc.push(token);
            acc
        })
        .finish()
}
