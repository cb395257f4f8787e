//! Helpers for the `*highlighted*` markup used in example sentences.
//!
//! Examples mark the word they illustrate by wrapping it in asterisks, e.g.
//! `"I live in a *house*."`. Case and accent insensitive comparisons are done in
//! SQL by the `clean_text` function, not here.

use lazy_static::lazy_static;
use regex::Regex;

pub const HIGHLIGHT_CHAR: char = '*';
pub const BLANK: &str = "_____";

lazy_static! {
    static ref HIGHLIGHTED_WORD: Regex = Regex::new(r"\*+[^*\s]+\*+").unwrap();
}

/// True when at least one word is wrapped in `*`. Trailing punctuation after
/// the closing marker is allowed.
pub fn is_highlighted(text: &str) -> bool {
    HIGHLIGHTED_WORD.is_match(text)
}

/// Removes every highlight marker.
pub fn strip_highlight(text: &str) -> String {
    text.replace(HIGHLIGHT_CHAR, "")
}

/// Replaces each highlighted word by a blank to be filled in.
pub fn blank_highlight(text: &str) -> String {
    HIGHLIGHTED_WORD.replace_all(text, BLANK).into_owned()
}

/// Splits a sentence into its words, without highlight markers.
pub fn words(text: &str) -> Vec<String> {
    strip_highlight(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
