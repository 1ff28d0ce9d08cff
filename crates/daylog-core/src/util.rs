//! Small text helpers for configuration values and service error bodies.

const MAX_ERROR_TEXT_CHARS: usize = 180;

/// Trimmed text, or `None` when missing or blank.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

/// HTTP(S) base URL without trailing slashes. Other schemes are rejected.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let base = raw.trim().trim_end_matches('/');
    let is_http = base.starts_with("http://") || base.starts_with("https://");
    is_http.then(|| base.to_string())
}

/// First characters of a response body, for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(MAX_ERROR_TEXT_CHARS).collect()
}
