use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid separator pattern"));

/// Lower-cases `text` and splits it on runs of non-word characters.
///
/// Empty fragments are dropped; duplicates and order are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    NON_WORD
        .split(&text.to_lowercase())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
