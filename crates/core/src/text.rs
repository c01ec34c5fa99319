//! Word counting over extracted regulation text.

/// Tokens this short or shorter are treated as markup remnants and skipped.
const MIN_TOKEN_LEN: usize = 2;

/// Count meaningful words in plain text.
///
/// The text is lowercased, every character that is neither an ASCII word
/// character (`[A-Za-z0-9_]`) nor whitespace becomes a space, and the result is
/// split on whitespace runs. Tokens of length two or less are discarded.
pub fn count_words(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }

    let normalized: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() { c.to_ascii_lowercase() } else { ' ' }
        })
        .collect();

    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_LEN)
        .count()
}
