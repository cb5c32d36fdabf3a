use std::borrow::Cow;
use std::str::SplitWhitespace;

use crate::domain::Post;
use crate::domain::text::strip_markup;

/// Whitespace-delimited tokens of a text field.
///
/// The stream is `Copy`: each `into_iter` starts a fresh scan over the same
/// text. Tokens are raw substrings; no case folding or punctuation stripping.
#[derive(Debug, Clone, Copy)]
pub struct TokenStream<'a> {
    text: &'a str,
}

impl<'a> TokenStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }
}

impl<'a> IntoIterator for TokenStream<'a> {
    type Item = &'a str;
    type IntoIter = SplitWhitespace<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.text.split_whitespace()
    }
}

/// Which post field is tokenized as the post body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentSource {
    /// Rendered HTML with the markup stripped.
    #[default]
    Rendered,
    /// Raw Markdown; posts without it fall back to the rendered content.
    Markdown,
}

impl ContentSource {
    pub fn text<'p>(&self, post: &'p Post) -> Cow<'p, str> {
        match (self, post.markdown.as_deref()) {
            (ContentSource::Markdown, Some(markdown)) => Cow::Borrowed(markdown),
            _ => strip_markup(&post.content),
        }
    }
}
