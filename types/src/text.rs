//! Small pure text helpers.

/// Truncate `s` and append `suffix` if it exceeds `threshold` characters.
///
/// - `threshold`: character count at which truncation kicks in.
/// - `take`: how many characters of content to keep when truncating.
fn truncate_core(s: &str, threshold: usize, take: usize, suffix: &str) -> String {
    if s.chars().count() <= threshold {
        return s.to_string();
    }
    let head: String = s.chars().take(take).collect();
    format!("{head}{suffix}")
}

/// First `max_chars` characters of `raw`, no suffix.
///
/// Counts `char`s, not bytes, so multi-byte text is never split.
#[must_use]
pub fn preview(raw: &str, max_chars: usize) -> String {
    truncate_core(raw, max_chars, max_chars, "")
}

/// Truncate a string to a maximum length, adding `...` if needed.
///
/// - Trims surrounding whitespace before truncating.
/// - Enforces a minimum `max` of 3 so the ellipsis fits.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let take = max.saturating_sub(3);
    truncate_core(raw.trim(), max, take, "...")
}
