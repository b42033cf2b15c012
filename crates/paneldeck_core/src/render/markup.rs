//! HTML text helpers for the page skeleton.

/// Escapes text for element content and double-quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Visible error fragment scoped to one region or tab.
pub(crate) fn error_fragment(code: &str, subject: &str) -> String {
    format!(
        "<div class=\"paneldeck-error\" data-error=\"{}\" data-subject=\"{}\"></div>",
        escape(code),
        escape(subject)
    )
}
