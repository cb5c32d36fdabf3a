use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

pub type PostId = i64;

/// The author-editable fields of a post, written together on edit.
#[derive(Debug, Clone, PartialEq)]
pub struct PostContent {
    pub title: String,
    pub content: String,
    pub markdown: Option<String>,
    pub excerpt: String,
}

/// Post entity - a blog post owned by a single author.
///
/// An `id` of zero marks a draft the store has not assigned an identity to yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub slug: String,
    /// Rendered HTML shown to readers.
    pub content: String,
    /// Raw authoring text, present when the post was written in Markdown.
    pub markdown: Option<String>,
    pub excerpt: String,
    pub published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new unpublished post.
    pub fn draft(
        author_id: UserId,
        title: String,
        slug: String,
        content: String,
        markdown: Option<String>,
        excerpt: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            author_id,
            title,
            slug,
            content,
            markdown,
            excerpt,
            published: false,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Replace the editable fields, leaving publication state and counters alone.
    pub fn apply_content(&mut self, edit: PostContent) {
        self.title = edit.title;
        self.content = edit.content;
        self.markdown = edit.markdown;
        self.excerpt = edit.excerpt;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
