//! Content rendering.

mod markdown;

pub use markdown::MarkdownRenderer;
