use crate::error::DomainError;

/// A validated search query: trimmed, non-empty and bounded in length.
///
/// The text is only ever compared, never interpreted as markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Longest accepted query, in characters.
    pub const MAX_CHARS: usize = 256;

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "search query must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > Self::MAX_CHARS {
            return Err(DomainError::Validation(format!(
                "search query must be at most {} characters",
                Self::MAX_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whitespace-separated terms of the query.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }
}
