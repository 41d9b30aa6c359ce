const ALLOWED_CONTENT_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];

/// Returns true when the declared media type is an HTML document.
///
/// Matching is a case-insensitive prefix test, so parameters such as
/// `; charset=utf-8` are accepted. An empty value is rejected.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim_start().to_lowercase();
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| content_type.starts_with(allowed))
}
