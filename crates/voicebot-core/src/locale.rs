//! Locale tag helpers.
//!
//! Locale tags are BCP-47-style strings such as `"en-US"` or `"es-ES"`.
//! Only the primary language subtag matters for answer language; the full
//! tag is kept for recognition and voice selection.

/// Locale used when a request does not name one.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Reduce a locale tag to its lowercase primary language subtag.
///
/// `"es-ES"` → `"es"`, `"pt_BR"` → `"pt"`. A blank tag yields the default
/// locale's language.
#[must_use]
pub fn base_language(locale: &str) -> String {
    let tag = locale.trim();
    let tag = if tag.is_empty() { DEFAULT_LOCALE } else { tag };
    tag.split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_ascii_lowercase()
}

/// Whether two locale tags share a primary language (case-insensitive).
#[must_use]
pub fn same_language(a: &str, b: &str) -> bool {
    base_language(a) == base_language(b)
}
