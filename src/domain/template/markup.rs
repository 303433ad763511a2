//! Markup module.
//!
//! This module converts the lightweight markup allowed in merge
//! templates (bold, links, line breaks) into provider-ready HTML.

use regex::Regex;

/// Converts the given text into an HTML body: `**text**` becomes bold,
/// `[label](url)` becomes a link for http/https URLs only, newlines
/// become `<br>` and double spaces survive as non-collapsing spaces.
/// The result is wrapped in a fixed Verdana container so rendering
/// stays consistent across recipients and mail clients.
pub fn to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = Regex::new(r"\*\*(.*?)\*\*")
        .unwrap()
        .replace_all(text, "<b>${1}</b>");
    let text = Regex::new(r"\[(.*?)\]\((https?://[^\s)]+)\)")
        .unwrap()
        .replace_all(
            &text,
            "<a href=\"${2}\" style=\"color:#1a73e8; text-decoration:underline;\" target=\"_blank\">${1}</a>",
        );
    let text = text.replace('\n', "<br>").replace("  ", "&nbsp;&nbsp;");

    format!(
        "<html><body style=\"font-family: Verdana, sans-serif; font-size: 14px; line-height: 1.6;\">{}</body></html>",
        text
    )
}
