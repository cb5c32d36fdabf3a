//! Text helpers shared by post authoring and search.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<[^>]*>").expect("valid regex");
    static ref SLUG_SEPARATOR: Regex = Regex::new(r"[^\p{L}\p{N}]+").expect("valid regex");
}

/// Number of words kept in a post excerpt.
pub const EXCERPT_WORDS: usize = 15;

/// Remove HTML tags and decode the basic entities.
///
/// Tags are replaced with a space so that words on either side of a tag
/// boundary stay separate tokens.
pub fn strip_markup(html: &str) -> Cow<'_, str> {
    if !html.contains('<') && !html.contains('&') {
        return Cow::Borrowed(html);
    }
    let without_tags = TAG.replace_all(html, " ");
    Cow::Owned(decode_entities(&without_tags))
}

fn decode_entities(text: &str) -> String {
    // &amp; last, otherwise "&amp;lt;" would decode twice
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// First [`EXCERPT_WORDS`] words of the content, markup removed.
pub fn excerpt(content: &str) -> String {
    strip_markup(content)
        .split_whitespace()
        .take(EXCERPT_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL slug for a title: lowercase words joined by dashes.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    SLUG_SEPARATOR
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Normalise editor output: drop raw newlines, then turn paragraph and line
/// break tags into newlines.
pub fn cleanup(input: &str) -> String {
    input
        .replace('\n', "")
        .replace("</p>", "\n")
        .replace("<br>", "\n")
        .replace("</br>", "\n")
        .replace("<br/>", "\n")
}
