/*!
 * Wire formats between subtitle entries and the language model.
 *
 * Entries go out either as numbered lines (`12 Some text`) or as a
 * `<subtitles>` XML block. Replies are read back into a map keyed by the
 * entry's sequence number, accepting either format.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::app_config::SubtitleConfig;
use crate::errors::TranslationError;
use crate::segmentation::boundary::char_len;
use crate::segmentation::wrap::wrap_text;
use crate::subtitle_processor::SubtitleEntry;

/// `12 text`, `12. text`, `12: text`, `12) text` or `12 - text`
static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)[\s.:\-)]+(.*)$").unwrap());

/// A `<line ...>text</line>` or `<line .../>` element
static LINE_ELEMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<line\b([^>]*?)(?:/>|>(.*?)</line\s*>)"#).unwrap());

static INDEX_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bindex\s*=\s*["']([^"']*)["']"#).unwrap());

static ID_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bid\s*=\s*["']([^"']*)["']"#).unwrap());

/// An entry's lines joined into one line of text
pub fn entry_text(entry: &SubtitleEntry) -> String {
    entry
        .lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Numbered lines for every entry that has text
pub fn format_entries(entries: &[SubtitleEntry]) -> String {
    entries
        .iter()
        .filter_map(|entry| {
            let text = entry_text(entry);
            (!text.is_empty()).then(|| format!("{} {}", entry.seq_num, text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A `<subtitles>` block with one `<line>` per entry
pub fn format_entries_xml(entries: &[SubtitleEntry]) -> String {
    let mut parts = vec!["<subtitles>".to_string()];
    parts.extend(
        entries
            .iter()
            .map(|entry| format!("  <line index=\"{}\">{}</line>", entry.seq_num, escape_xml(&entry_text(entry)))),
    );
    parts.push("</subtitles>".to_string());
    parts.join("\n")
}

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// Indexed line elements, or None when the text is not an XML block
fn xml_elements(text: &str) -> Option<Vec<(usize, String)>> {
    let stripped = text.trim();
    if !stripped.starts_with('<') || !stripped.ends_with('>') {
        return None;
    }

    let elements = LINE_ELEMENT_REGEX
        .captures_iter(stripped)
        .filter_map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let index = INDEX_ATTR_REGEX
                .captures(attrs)
                .or_else(|| ID_ATTR_REGEX.captures(attrs))?
                .get(1)?
                .as_str()
                .trim()
                .parse::<usize>()
                .ok()?;
            let body = caps.get(2).map_or("", |m| m.as_str());
            Some((index, unescape_xml(body).trim().to_string()))
        })
        .collect();
    Some(elements)
}

/// Index-keyed lines from an XML reply, `None` if there are none
pub fn parse_xml_lines(translated: &str) -> Option<BTreeMap<usize, String>> {
    let mapping: BTreeMap<usize, String> = xml_elements(translated)?.into_iter().collect();
    (!mapping.is_empty()).then_some(mapping)
}

/// Read a reply into a map keyed by sequence number
///
/// XML replies are taken as-is. Numbered replies may wrap onto unnumbered
/// continuation lines. A reply numbered `1..=n` for `n` expected entries
/// is remapped onto the expected numbers in order.
pub fn parse_translated_lines(
    translated: &str,
    expected: &[usize],
) -> Result<BTreeMap<usize, String>, TranslationError> {
    if let Some(mapping) = parse_xml_lines(translated) {
        return Ok(mapping);
    }

    let mut ordered: Vec<(usize, String)> = Vec::new();
    for raw_line in translated.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        match numbered_line(line) {
            Some((index, text)) => ordered.push((index, text.to_string())),
            None => match ordered.last_mut() {
                Some((_, text)) => *text = format!("{} {}", text, line).trim().to_string(),
                None => {
                    return Err(TranslationError::ResponseMismatch(format!(
                        "line without numbering: {}",
                        line
                    )));
                }
            },
        }
    }

    // Later lines win on a repeated number
    let mapping: BTreeMap<usize, String> = ordered.iter().cloned().collect();
    let expected_set: BTreeSet<usize> = expected.iter().copied().collect();
    let mapped_set: BTreeSet<usize> = mapping.keys().copied().collect();
    if mapped_set == expected_set {
        return Ok(mapping);
    }

    let sequential = ordered.len() == expected.len() && ordered.iter().enumerate().all(|(pos, (index, _))| *index == pos + 1);
    if sequential {
        return Ok(expected.iter().copied().zip(ordered.into_iter().map(|(_, text)| text)).collect());
    }

    let missing: Vec<usize> = expected_set.difference(&mapped_set).copied().collect();
    let unexpected: Vec<usize> = mapped_set.difference(&expected_set).copied().collect();
    let mut details = Vec::new();
    if !missing.is_empty() {
        details.push(format!("missing indices {:?}", missing));
    }
    if !unexpected.is_empty() {
        details.push(format!("unexpected indices {:?}", unexpected));
    }
    Err(TranslationError::ResponseMismatch(details.join(", ")))
}

fn numbered_line(line: &str) -> Option<(usize, &str)> {
    let caps = LINE_PATTERN.captures(line)?;
    let index = caps.get(1)?.as_str().parse::<usize>().ok()?;
    Some((index, caps.get(2).map_or("", |m| m.as_str().trim())))
}

/// Pair reply lines with the expected numbers by position
///
/// Works when the reply has exactly one non-empty line per expected entry,
/// whatever numbers it carries.
pub fn fallback_sequential_mapping(translated: &str, expected: &[usize]) -> Option<BTreeMap<usize, String>> {
    if let Some(mapping) = parse_xml_lines(translated) {
        return Some(mapping);
    }

    let lines: Vec<&str> = translated.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
    if lines.len() != expected.len() {
        return None;
    }

    let cleaned: Vec<String> = lines
        .iter()
        .map(|line| numbered_line(line).map_or(*line, |(_, text)| text).to_string())
        .collect();
    if cleaned.iter().any(|text| text.is_empty()) {
        return None;
    }

    Some(expected.iter().copied().zip(cleaned).collect())
}

/// Keep only the lines of a numbered or XML block whose number is in `indices`
pub fn filter_block_by_indices(block: Option<&str>, indices: &[usize]) -> Option<String> {
    let block = block?;
    let stripped = block.trim();
    if stripped.is_empty() {
        return None;
    }
    let allowed: BTreeSet<usize> = indices.iter().copied().collect();

    if stripped.starts_with('<') {
        let Some(elements) = xml_elements(stripped) else {
            return Some(block.to_string());
        };
        let kept: Vec<String> = elements
            .into_iter()
            .filter(|(index, _)| allowed.contains(index))
            .map(|(index, text)| format!("  <line index=\"{}\">{}</line>", index, escape_xml(&text)))
            .collect();
        if kept.is_empty() {
            return None;
        }
        return Some(format!("<subtitles>\n{}\n</subtitles>", kept.join("\n")));
    }

    let kept: Vec<&str> = stripped
        .lines()
        .map(str::trim)
        .filter(|line| numbered_line(line).is_some_and(|(index, _)| allowed.contains(&index)))
        .collect();
    (!kept.is_empty()).then(|| kept.join("\n"))
}

/// Lay translated text out as cue lines
///
/// The model's own line breaks are kept when they already fit the layout.
pub fn wrap_translated_text(text: &str, config: &SubtitleConfig) -> Vec<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
    let fits = !lines.is_empty()
        && lines.len() <= config.max_lines
        && lines.iter().all(|line| char_len(line) <= config.max_cpl);
    if fits {
        return lines.into_iter().map(String::from).collect();
    }

    wrap_text(
        &lines.join(" "),
        config.max_cpl,
        config.max_lines,
        &config.line_split_delimiters,
    )
}
