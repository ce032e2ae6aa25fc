//! Mapping of arbitrary strings onto Mackerel's metric-name character set.

/// Returns `true` if `c` may appear in a Mackerel metric name.
pub fn is_legal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '#' | '*')
}

/// Replace every character outside `[0-9a-zA-Z._#*-]` with `_`.
///
/// The mapping is one character for one character, so the output has the same
/// number of chars as the input. It never fails and is idempotent.
pub fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| if is_legal_char(c) { c } else { '_' })
        .collect()
}
