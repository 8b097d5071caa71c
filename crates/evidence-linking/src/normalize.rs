/// Reduce text to lowercase ASCII alphanumerics.
///
/// Whitespace, punctuation, hyphens and any non-ASCII character are dropped,
/// so line-wrapping artifacts from PDF extraction don't affect comparisons.
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
