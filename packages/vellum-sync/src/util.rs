//! Small text helpers.
//!
//! Offsets are character offsets everywhere in this crate (document
//! coordinates count characters, not bytes); these helpers do the conversions
//! at the `String` boundary.

use crate::surface::PLACEHOLDER;

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `char_offset`-th character, clamped to the end.
pub fn byte_index_at(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

pub fn strip_placeholders(s: &str) -> String {
    if !s.contains(PLACEHOLDER) {
        return s.to_string();
    }
    s.chars().filter(|c| *c != PLACEHOLDER).collect()
}
