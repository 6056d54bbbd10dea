//! Helpers for Telegram's HTML parse mode.

use teloxide::utils::html::escape;

/// Escapes text for use inside a quoted attribute value.
pub fn escape_attr(value: &str) -> String {
    escape(value).replace('"', "&quot;").replace('\'', "&#39;")
}

/// `<a>` tag for `url`, or `None` when there is no URL. `label` must already be escaped.
pub fn link(url: &str, label: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        None
    } else {
        Some(format!("<a href=\"{}\">{}</a>", escape_attr(url), label))
    }
}

/// Drops tags and decodes entities, for resending a message Telegram
/// refused to parse as HTML.
pub fn to_plain(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
