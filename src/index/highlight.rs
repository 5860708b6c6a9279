//! Snippet highlighting

use crate::tokenizer::is_cjk;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";
const ELLIPSIS: char = '…';

/// Builds a snippet of `text` around the first occurrence of any term
///
/// Matching is case-insensitive. Latin terms only match whole words; CJK
/// terms match anywhere. Overlapping matches are merged and wrapped in
/// [`MARK_OPEN`]/[`MARK_CLOSE`]. The window is `snippet_chars` characters
/// of whitespace-collapsed text, with an ellipsis on each truncated side.
///
/// Returns `None` when no term occurs in `text`.
pub fn highlight(text: &str, terms: &[String], snippet_chars: usize) -> Option<String> {
    let chars: Vec<char> = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();
    let folded: Vec<char> = chars.iter().map(|&c| fold(c)).collect();

    let mut ranges = Vec::new();
    for term in terms {
        let needle: Vec<char> = term.chars().map(fold).collect();
        ranges.extend(find_all(&folded, &needle));
    }
    if ranges.is_empty() {
        return None;
    }
    ranges.sort_unstable();
    let ranges = merge(ranges);

    let width = snippet_chars.max(1);
    let first = ranges[0].0;
    let mut start = first.saturating_sub(width / 4);
    let end = (start + width).min(chars.len());
    if end - start < width {
        start = end.saturating_sub(width);
    }

    let mut out = String::new();
    if start > 0 {
        out.push(ELLIPSIS);
    }
    let mut pos = start;
    for (s, e) in ranges {
        if s >= end {
            break;
        }
        let e = e.min(end);
        out.extend(&chars[pos..s]);
        out.push_str(MARK_OPEN);
        out.extend(&chars[s..e]);
        out.push_str(MARK_CLOSE);
        pos = e;
    }
    out.extend(&chars[pos..end]);
    if end < chars.len() {
        out.push(ELLIPSIS);
    }

    Some(out)
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() && !is_cjk(c)
}

fn find_all(haystack: &[char], needle: &[char]) -> Vec<(usize, usize)> {
    let n = needle.len();
    if n == 0 || n > haystack.len() {
        return Vec::new();
    }
    let (Some(&head), Some(&tail)) = (needle.first(), needle.last()) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for i in 0..=haystack.len() - n {
        if haystack[i..i + n] != *needle {
            continue;
        }
        let left_ok = is_cjk(head) || i == 0 || !is_word_char(haystack[i - 1]);
        let right_ok = is_cjk(tail) || i + n == haystack.len() || !is_word_char(haystack[i + n]);
        if left_ok && right_ok {
            found.push((i, i + n));
        }
    }
    found
}

/// Merges sorted ranges that overlap or touch
fn merge(ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (s, e) in ranges {
        match merged.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }
    merged
}
