//! Text normalization and literal match finding over verse text

use serde::{Deserialize, Serialize};
use std::ops::Range;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A contiguous match region inside a verse's text.
///
/// `start_index` and `length` are UTF-8 byte offsets, always on char
/// boundaries, so `&text[start_index..start_index + length] == matched_text`.
/// They serialize as bytes too; consumers indexing by UTF-16 code units
/// (JavaScript strings) should convert with [`TextHighlight::utf16_range`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextHighlight {
    pub start_index: usize,
    pub length: usize,
    pub matched_text: String,
}

impl TextHighlight {
    fn from_range(text: &str, range: Range<usize>) -> Self {
        Self {
            start_index: range.start,
            length: range.len(),
            matched_text: text[range].to_string(),
        }
    }

    /// Exclusive end offset, or `None` if the span overflows `usize`.
    pub fn end_index(&self) -> Option<usize> {
        self.start_index.checked_add(self.length)
    }

    /// Same span in UTF-16 code units, for UIs that index text that way.
    ///
    /// Returns `None` if the span does not fit `text`.
    pub fn utf16_range(&self, text: &str) -> Option<Range<usize>> {
        let prefix = text.get(..self.start_index)?;
        let span = text.get(self.start_index..self.end_index()?)?;
        let start = prefix.encode_utf16().count();
        Some(start..start + span.encode_utf16().count())
    }
}

/// Normalize text for accent- and case-insensitive comparison.
///
/// Blank input yields an empty string. With `preserve_case` the trimmed input
/// is returned as-is; otherwise it is NFD-decomposed, stripped of combining
/// marks and upper-cased.
pub fn normalize(text: &str, preserve_case: bool) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if preserve_case {
        return trimmed.to_string();
    }

    let stripped: String = trimmed.nfd().filter(|c| !is_combining_mark(*c)).collect();
    // Stripping marks can expose whitespace at the edges.
    stripped.to_uppercase().trim().to_string()
}

/// Simple (single char) upper-case mapping, falling back to the char itself
/// where the full mapping expands.
fn fold_case(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Find every non-overlapping occurrence of `search_text` in `text`, left to right.
///
/// Comparison is ordinal; with `case_sensitive == false` chars are compared
/// by their simple upper-case mapping. Diacritics are significant here.
/// After a match the scan resumes at the end of that match.
pub fn find_matches(text: &str, search_text: &str, case_sensitive: bool) -> Vec<TextHighlight> {
    if text.is_empty() || search_text.is_empty() {
        return Vec::new();
    }

    if case_sensitive {
        find_ordinal(text, search_text)
    } else {
        find_ordinal_ignore_case(text, search_text)
    }
}

fn find_ordinal(text: &str, search_text: &str) -> Vec<TextHighlight> {
    let mut matches = Vec::new();
    let mut from = 0;

    while let Some(pos) = text[from..].find(search_text) {
        let start = from + pos;
        let end = start + search_text.len();
        matches.push(TextHighlight::from_range(text, start..end));
        from = end;
    }

    matches
}

fn find_ordinal_ignore_case(text: &str, search_text: &str) -> Vec<TextHighlight> {
    let needle: Vec<char> = search_text.chars().map(fold_case).collect();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut matches = Vec::new();
    let mut i = 0;

    while i + needle.len() <= chars.len() {
        let window = &chars[i..i + needle.len()];
        let hit = window
            .iter()
            .zip(&needle)
            .all(|(&(_, c), &n)| fold_case(c) == n);

        if hit {
            let start = chars[i].0;
            let end = chars
                .get(i + needle.len())
                .map_or(text.len(), |&(byte_idx, _)| byte_idx);
            matches.push(TextHighlight::from_range(text, start..end));
            i += needle.len();
        } else {
            i += 1;
        }
    }

    matches
}
