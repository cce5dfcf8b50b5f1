//! Reading time estimate

use lazy_static::lazy_static;
use regex::Regex;

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 150;

lazy_static! {
    // A whitespace run, optionally preceded by a comma, separates two words
    static ref WORD_SEPARATOR: Regex = Regex::new(r",?\s+").unwrap();
}

/// Count the words in a block of text
pub fn word_count(text: &str) -> usize {
    let sanitized = WORD_SEPARATOR.replace_all(text, " ");
    sanitized.split(' ').filter(|chunk| !chunk.is_empty()).count()
}

/// Whole minutes needed to read `text`, rounded half up
pub fn reading_minutes(text: &str) -> usize {
    (word_count(text) + WORDS_PER_MINUTE / 2) / WORDS_PER_MINUTE
}

/// Human readable reading time, e.g. "4 min"
pub fn get_reading_time(text: &str) -> String {
    format!("{} min", reading_minutes(text))
}
