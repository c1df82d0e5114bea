/*!
 * Line wrapping for final segments.
 *
 * Policies are tried in order and the first that succeeds wins:
 * preferred delimiters, single line, token-aware two-line split (then a
 * greedy fill when more than two lines are allowed), and finally a
 * whitespace bisection or a hard character cut. The result never holds
 * more than `max_lines` lines.
 */

use crate::app_config::SubtitleConfig;
use crate::segmentation::boundary::{char_len, is_safe_boundary, take_chars, ELLIPSIS};
use crate::segmentation::segmenter::Segment;

/// Wrap a segment's display text into at most `max_lines` lines
pub fn wrap_segment(segment: &Segment<'_>, config: &SubtitleConfig) -> Vec<String> {
    let pieces = display_pieces(segment);
    let text = segment.display_text();

    let mut lines = wrap_lines(
        &pieces,
        &text,
        config.max_cpl,
        config.max_lines,
        &config.line_split_delimiters,
    );
    lines.truncate(config.max_lines);
    lines
}

// Word texts with the ellipsis markers glued to the outer words
fn display_pieces(segment: &Segment<'_>) -> Vec<String> {
    let mut pieces: Vec<String> = segment.words.iter().map(|w| w.text.clone()).collect();

    if segment.prefix_ellipsis {
        if let Some(first) = pieces.first_mut() {
            *first = format!("{}{}", ELLIPSIS, first.trim_start());
        }
    }
    if segment.suffix_ellipsis {
        if let Some(last) = pieces.last_mut() {
            *last = format!("{}{}", last.trim_end(), ELLIPSIS);
        }
    }
    pieces
}

/// Wrap `text`, made of the word `pieces`, into lines
pub fn wrap_lines(
    pieces: &[String],
    text: &str,
    max_cpl: usize,
    max_lines: usize,
    delimiters: &[char],
) -> Vec<String> {
    let stripped = text.trim();
    if max_lines <= 1 {
        return vec![stripped.to_string()];
    }

    if !delimiters.is_empty() {
        if let Some(lines) = wrap_with_preferred_delimiters(stripped, delimiters, max_cpl, max_lines) {
            return lines;
        }
    }

    if char_len(stripped) <= max_cpl {
        return vec![stripped.to_string()];
    }

    if let Some(lines) = split_token_aware(pieces, max_cpl) {
        return lines;
    }

    if max_lines > 2 {
        if let Some(lines) = fill_safe_lines(pieces, max_cpl, max_lines) {
            return lines;
        }
    }

    fallback_split(stripped, max_cpl, max_lines)
}

/// Wrap plain text that has no word timing, such as a translated cue
pub fn wrap_text(text: &str, max_cpl: usize, max_lines: usize, delimiters: &[char]) -> Vec<String> {
    let stripped = text.trim();
    if max_lines <= 1 {
        return vec![stripped.to_string()];
    }

    if !delimiters.is_empty() {
        if let Some(lines) = wrap_with_preferred_delimiters(stripped, delimiters, max_cpl, max_lines) {
            return lines;
        }
    }

    if char_len(stripped) <= max_cpl {
        return vec![stripped.to_string()];
    }

    let mut lines = fallback_split(stripped, max_cpl, max_lines);
    lines.retain(|line| !line.is_empty());
    lines.truncate(max_lines);
    lines
}

/// Split on delimiter characters, keeping each delimiter with its chunk
pub fn split_text_by_delimiters(text: &str, delimiters: &[char]) -> Vec<String> {
    let cleaned = text.replace('\n', " ");
    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in cleaned.chars() {
        current.push(ch);
        if delimiters.contains(&ch) {
            let chunk = current.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

fn wrap_with_preferred_delimiters(
    text: &str,
    delimiters: &[char],
    max_cpl: usize,
    max_lines: usize,
) -> Option<Vec<String>> {
    let chunks = split_text_by_delimiters(text, delimiters);
    if chunks.len() <= 1 {
        return None;
    }

    let lines: Vec<String> = partition_chunks(&chunks, max_lines, max_cpl)?
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() <= 1 {
        return None;
    }
    Some(lines.into_iter().take(max_lines).collect())
}

/// Pack chunks into at most `max_lines` lines of at most `max_cpl` characters
///
/// Prefers the shortest possible first line whose remainder still packs,
/// decided with a table over (chunk index, lines left).
pub fn partition_chunks(chunks: &[String], max_lines: usize, max_cpl: usize) -> Option<Vec<String>> {
    let n = chunks.len();
    if n == 0 || max_lines == 0 {
        return None;
    }

    let lens: Vec<usize> = chunks.iter().map(|c| char_len(c)).collect();
    // Length of chunks[start..=end] joined with single spaces
    let line_len = |start: usize, end: usize| -> usize {
        lens[start..=end].iter().sum::<usize>() + (end - start)
    };

    // feasible[s][r]: chunks[s..] fit into at most r lines
    let mut feasible = vec![vec![false; max_lines + 1]; n + 1];
    feasible[n].iter_mut().for_each(|f| *f = true);
    for start in (0..n).rev() {
        for remaining in 1..=max_lines {
            let fits = (start..n)
                .take_while(|&end| line_len(start, end) <= max_cpl)
                .any(|end| feasible[end + 1][remaining - 1]);
            feasible[start][remaining] = fits;
        }
    }

    if !feasible[0][max_lines] {
        return None;
    }

    let mut lines = Vec::new();
    let mut start = 0;
    let mut remaining = max_lines;
    while start < n {
        let end = (start..n)
            .take_while(|&end| line_len(start, end) <= max_cpl)
            .find(|&end| feasible[end + 1][remaining - 1])?;
        lines.push(chunks[start..=end].join(" "));
        start = end + 1;
        remaining -= 1;
    }
    Some(lines)
}

fn safe_after(pieces: &[String]) -> Vec<bool> {
    pieces
        .windows(2)
        .map(|pair| !pair[1].is_empty() && is_safe_boundary(&pair[0], &pair[1]))
        .collect()
}

fn concat(pieces: &[String]) -> String {
    pieces.concat().trim().to_string()
}

/// Two-line split at a safe word boundary, both lines within `max_cpl`
fn split_token_aware(pieces: &[String], max_cpl: usize) -> Option<Vec<String>> {
    let safe = safe_after(pieces);
    let is_safe = |i: usize| safe.get(i).copied().unwrap_or(false);
    let split_at = |i: usize| -> (String, String) { (concat(&pieces[..=i]), concat(&pieces[i + 1..])) };

    // Last safe boundary before the first line overflows
    let mut running = 0;
    let mut last_safe = None;
    for (i, piece) in pieces.iter().enumerate() {
        running += char_len(piece);
        if is_safe(i) {
            last_safe = Some(i);
        }
        if running > max_cpl {
            if let Some(last) = last_safe {
                for candidate in (0..=last).rev().filter(|&c| is_safe(c)) {
                    let (left, right) = split_at(candidate);
                    if char_len(&left) <= max_cpl && char_len(&right) <= max_cpl {
                        return Some(vec![left, right]);
                    }
                }
            }
            break;
        }
    }

    // Safe boundary nearest the character midpoint
    let total: usize = pieces.iter().map(|p| char_len(p)).sum();
    let target = total / 2;
    let mut acc = 0;
    let mut nearest: Option<(usize, usize)> = None;
    for i in 0..pieces.len().saturating_sub(1) {
        acc += char_len(&pieces[i]);
        if is_safe(i) {
            let delta = acc.abs_diff(target);
            if nearest.is_none_or(|(_, best)| delta < best) {
                nearest = Some((i, delta));
            }
        }
    }

    let (i, _) = nearest?;
    let (left, right) = split_at(i);
    (char_len(&left) <= max_cpl && char_len(&right) <= max_cpl).then(|| vec![left, right])
}

/// Greedy fill over safe boundaries for layouts of more than two lines
fn fill_safe_lines(pieces: &[String], max_cpl: usize, max_lines: usize) -> Option<Vec<String>> {
    let safe = safe_after(pieces);
    let mut lines = Vec::new();
    let mut current = String::new();

    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 && !current.trim().is_empty() && safe[i - 1] {
            let extended = char_len(format!("{}{}", current, piece).trim());
            if extended > max_cpl {
                lines.push(current.trim().to_string());
                current.clear();
            }
        }
        current.push_str(piece);
    }
    if !current.trim().is_empty() {
        lines.push(current.trim().to_string());
    }

    let fits = lines.len() > 1
        && lines.len() <= max_lines
        && lines.iter().all(|line| char_len(line) <= max_cpl);
    fits.then_some(lines)
}

/// Whitespace bisection from the midpoint, or a hard cut every `max_cpl` characters
pub fn fallback_split(text: &str, max_cpl: usize, max_lines: usize) -> Vec<String> {
    if max_cpl == 0 {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if chars.contains(&' ') {
        let target = len / 2;
        let break_pos = (0..len)
            .find_map(|delta| {
                if delta <= target && target - delta > 0 && chars[target - delta] == ' ' {
                    Some(target - delta)
                } else if target + delta < len && chars[target + delta] == ' ' {
                    Some(target + delta)
                } else {
                    None
                }
            })
            .unwrap_or_else(|| len.min(max_cpl));

        let first: String = chars[..break_pos].iter().collect();
        let second: String = chars[break_pos..].iter().collect();
        return [first, second]
            .iter()
            .map(|line| take_chars(line.trim(), max_cpl).trim_end().to_string())
            .collect();
    }

    chars
        .chunks(max_cpl)
        .take(max_lines)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
