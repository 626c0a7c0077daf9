//! Minimal text diffing for a single leaf.
//!
//! Two tiers: a pure insertion (the overwhelmingly common case: typing, an
//! IME commit) is detected by common prefix/suffix and applied as one
//! `insert_text_at`, which commutes with unrelated formatting state.
//! Anything containing a deletion or replacement is reported as a full-range
//! replace of the leaf, which is more expensive and coarser at the edit site but
//! always correct.

use crate::util::{byte_index_at, char_len};

/// The edit that turns a leaf's model text into the surface's observed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafEdit {
    Unchanged,
    /// Insert `text` at character offset `at`.
    Insert { at: usize, text: String },
    /// Replace the leaf's entire text.
    Replace { text: String },
}

impl LeafEdit {
    pub fn is_noop(&self) -> bool {
        matches!(self, LeafEdit::Unchanged)
    }
}

/// Classify the difference between the surface's observed text and the
/// model's text for one leaf.
pub fn diff_leaf(observed: &str, model: &str) -> LeafEdit {
    if observed == model {
        return LeafEdit::Unchanged;
    }

    let prefix = common_chars_at_start(observed, model);
    let observed_rest = &observed[byte_index_at(observed, prefix)..];
    let model_rest = &model[byte_index_at(model, prefix)..];
    let suffix = common_chars_at_end(observed_rest, model_rest);

    if prefix + suffix == char_len(model) {
        // Only additions: everything between the matching ends was inserted
        // at the point where the prefix stopped matching.
        let start = byte_index_at(observed, prefix);
        let end = observed.len() - suffix_byte_len(observed_rest, suffix);
        LeafEdit::Insert {
            at: prefix,
            text: observed[start..end].to_string(),
        }
    } else {
        // A deletion or replacement is hiding somewhere in the middle.
        LeafEdit::Replace {
            text: observed.to_string(),
        }
    }
}

/// Number of characters that match position-for-position from the start.
fn common_chars_at_start(left: &str, right: &str) -> usize {
    left.chars()
        .zip(right.chars())
        .take_while(|(l, r)| l == r)
        .count()
}

/// Number of characters that match position-for-position from the end.
fn common_chars_at_end(left: &str, right: &str) -> usize {
    left.chars()
        .rev()
        .zip(right.chars().rev())
        .take_while(|(l, r)| l == r)
        .count()
}

/// Byte length of the last `suffix` characters of `s`.
fn suffix_byte_len(s: &str, suffix: usize) -> usize {
    s.chars()
        .rev()
        .take(suffix)
        .map(|c| c.len_utf8())
        .sum()
}
