//! Helpers for converting between char indices and byte indices.
//!
//! Every position exposed by this crate is a char index into the buffer's text,
//! whereas Rust string slicing needs byte indices.
//! These helpers never panic: out-of-range indices are clamped to the end of the text.

use std::ops::Range;

/// Returns the number of chars in the given text.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Converts a char index into a byte index within `text`.
///
/// If `char_index` is past the end of the text, this returns `text.len()`.
pub fn char_to_byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte_index, _)| byte_index)
}

/// Converts a byte index into a char index within `text`.
///
/// The byte index must lie on a char boundary, which is always the case
/// for indices obtained from regex matches or `char_indices()`.
pub fn byte_to_char_index(text: &str, byte_index: usize) -> usize {
    let byte_index = byte_index.min(text.len());
    text[..byte_index].chars().count()
}

/// Clamps the given char range such that it lies within a text of `len` chars
/// and such that `start <= end`.
pub fn clamp_range(range: &Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}

/// Returns the substring of `text` covered by the given char range,
/// clamping the range to the bounds of the text.
pub fn safe_substring_by_char_indices<'a>(text: &'a str, range: &Range<usize>) -> &'a str {
    let range = clamp_range(range, usize::MAX);
    let start = char_to_byte_index(text, range.start);
    let end = char_to_byte_index(text, range.end);
    &text[start..end.max(start)]
}

/// Replaces the chars in `range` with `replacement`, returning the new string.
///
/// The range is clamped to the bounds of the text.
pub fn safe_replace_by_char_indices(text: &str, range: &Range<usize>, replacement: &str) -> String {
    let start = char_to_byte_index(text, range.start);
    let end = char_to_byte_index(text, range.end).max(start);
    let mut new_text = String::with_capacity(text.len() - (end - start) + replacement.len());
    new_text.push_str(&text[..start]);
    new_text.push_str(replacement);
    new_text.push_str(&text[end..]);
    new_text
}
