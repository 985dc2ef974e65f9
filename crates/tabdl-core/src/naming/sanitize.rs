//! Filename component sanitization.

/// Characters that are invalid in file names on at least one common filesystem.
const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest component we produce, in characters.
const MAX_CHARS: usize = 100;

/// Sanitizes one path component (title, type, band name).
///
/// - Replaces `<>:"/\|?*`, NUL and control characters with `_`
/// - Trims leading/trailing spaces and dots
/// - Limits length to 100 characters
/// - Returns `fallback` when nothing usable remains
pub fn sanitize_component(name: &str, fallback: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if INVALID.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');
    let limited: String = trimmed.chars().take(MAX_CHARS).collect();
    if limited.is_empty() {
        fallback.to_string()
    } else {
        limited
    }
}
