//! Small string helpers: log-safe truncation, credential masking and slugs.

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a character
/// boundary) with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a source name to the slug the API stores alongside it.
///
/// Runs of anything outside `[a-z0-9]` (after lowercasing) collapse into a
/// single hyphen, and hyphens at either end are dropped.
///
/// # Arguments
///
/// * `name` - Display name of the source
///
/// # Returns
///
/// A lowercase, hyphenated, URL-safe string; empty when `name` has no ASCII
/// letters or digits.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("CNN Lite (US)"), "cnn-lite-us");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Render a bearer credential for logs: first four characters, then a mask.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if visible.chars().count() == token.chars().count() {
        return "****".to_string();
    }
    format!("{visible}****")
}
