//! Input normalization ahead of detection

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Replace literal `\n` and `\t` escape sequences with a space, collapse
/// whitespace runs and trim.
pub fn preprocess(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let unescaped = text.replace("\\n", " ").replace("\\t", " ");
    WHITESPACE_RUN
        .replace_all(&unescaped, " ")
        .trim()
        .to_string()
}
