/*!
 * Character classes shared by the segmentation stages.
 *
 * The rules here are deliberately small heuristics rather than a full
 * Unicode line-breaking implementation: a boundary between two pieces of
 * text is "safe" when the left side ends in whitespace or a break
 * punctuation mark, or when the right side starts with whitespace.
 */

/// Characters that end a sentence, Latin and CJK (including half-width forms)
pub const SENTENCE_ENDERS: &[char] = &['。', '.', '！', '!', '？', '?', '｡', '．'];

/// Characters that mark a clause break
pub const MINOR_BREAKERS: &[char] = &[',', ';', ':', '、', '，', '；', '：', '—', '–', '-'];

/// Characters a punctuation-only token may consist of to attach to the previous word
const ATTACHABLE_EXTRA: &[char] = &['…'];

/// Ellipsis used to mark a sentence that continues across cues
pub const ELLIPSIS: &str = "…";

pub fn is_sentence_ender(ch: char) -> bool {
    SENTENCE_ENDERS.contains(&ch)
}

pub fn is_minor_breaker(ch: char) -> bool {
    MINOR_BREAKERS.contains(&ch)
}

/// Whether a token made only of `text` should attach to the word before it
pub fn is_punctuation(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|ch| {
            is_sentence_ender(ch) || is_minor_breaker(ch) || ATTACHABLE_EXTRA.contains(&ch)
        })
}

/// Hiragana, Katakana and the CJK unified ideograph blocks
pub fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x3040..=0x309F      // Hiragana
        | 0x30A0..=0x30FF    // Katakana
        | 0x31F0..=0x31FF    // Katakana phonetic extensions
        | 0x3400..=0x4DBF    // CJK extension A
        | 0x4E00..=0x9FFF    // CJK unified ideographs
        | 0xF900..=0xFAFF    // CJK compatibility ideographs
        | 0xFF66..=0xFF9F    // Half-width Katakana
        | 0x20000..=0x2A6DF  // CJK extension B
    )
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Whether `text` ends (ignoring trailing whitespace) with a sentence ender
pub fn ends_with_sentence_ender(text: &str) -> bool {
    text.trim_end().chars().last().is_some_and(is_sentence_ender)
}

/// Number of characters as displayed, counted per Unicode scalar value
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Number of non-whitespace characters, used for reading speed
pub fn visible_char_count(text: &str) -> usize {
    text.chars().filter(|ch| !ch.is_whitespace()).count()
}

/// Whether breaking between `prev` and `next` keeps both sides legible
pub fn is_safe_boundary(prev: &str, next: &str) -> bool {
    if next.is_empty() {
        return true;
    }
    if next.starts_with(char::is_whitespace) {
        return true;
    }
    match prev.chars().last() {
        Some(last) => last.is_whitespace() || is_sentence_ender(last) || is_minor_breaker(last),
        None => false,
    }
}

/// First `max_chars` characters of `text`, never cutting inside a character
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
