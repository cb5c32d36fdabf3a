use std::collections::HashMap;
use std::sync::Arc;

use crate::authz::{PostAction, PostAuthorizationGuard};
use crate::domain::text::{cleanup, excerpt, slugify};
use crate::domain::{BlogSettings, Post, PostContent, PostId, UserId};
use crate::error::DomainError;
use crate::ports::{BackgroundTask, ContentRenderer, Job, JobQueue, PostRepository, UserRepository};
use crate::search::{SearchEngine, SearchQuery};

/// Slug kept free for the "new post" route.
pub const RESERVED_SLUG: &str = "new";

/// Author-supplied post fields for create and update.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub markdown: Option<String>,
}

/// A published post with its author's display name, ready for a feed.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub post: Post,
    pub author_name: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    renderer: Arc<dyn ContentRenderer>,
    jobs: Arc<dyn JobQueue>,
    engine: SearchEngine,
    guard: PostAuthorizationGuard,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        renderer: Arc<dyn ContentRenderer>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            posts,
            users,
            renderer,
            jobs,
            engine: SearchEngine::new(),
            guard: PostAuthorizationGuard,
        }
    }

    pub fn with_search_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Store a new unpublished post owned by `actor`.
    pub async fn create(
        &self,
        actor: UserId,
        draft: PostDraft,
        settings: &BlogSettings,
    ) -> Result<Post, DomainError> {
        let composed = self.compose(draft, settings)?;
        let slug = self.unique_slug(&composed.title).await?;
        let post = Post::draft(
            actor,
            composed.title,
            slug,
            composed.content,
            composed.markdown,
            composed.excerpt,
        );
        Ok(self.posts.save(post).await?)
    }

    /// Read a post by slug or id and queue a view count for it.
    pub async fn get(&self, key: &str, viewer: Option<UserId>) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_slug_or_id(key)
            .await?
            .filter(|post| self.guard.is_visible_to(post, viewer))
            .ok_or_else(|| DomainError::post_not_found(key))?;

        // a lost view count must not fail the read; the queue reports rejections
        let _ = self
            .jobs
            .enqueue(Job::new(BackgroundTask::IncrementViews { post_id: post.id }))
            .await;

        Ok(post)
    }

    pub async fn list_published(&self) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.find_all().await?;
        Ok(posts
            .into_iter()
            .filter(|post| self.guard.is_searchable(post))
            .collect())
    }

    pub async fn list_by_author(
        &self,
        author: UserId,
        viewer: Option<UserId>,
    ) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.find_by_author(author).await?;
        Ok(posts
            .into_iter()
            .filter(|post| self.guard.is_visible_to(post, viewer))
            .collect())
    }

    /// Replace title and body. The slug stays stable so existing links keep working.
    pub async fn update(
        &self,
        key: &str,
        actor: UserId,
        draft: PostDraft,
        settings: &BlogSettings,
    ) -> Result<Post, DomainError> {
        let existing = self.posts.find_by_slug_or_id(key).await?;
        let post = self.guard.authorize(existing, key, actor, PostAction::Edit)?;

        let edit = self.compose(draft, settings)?;
        Ok(self.posts.update_content(post.id, edit).await?)
    }

    pub async fn publish(&self, key: &str, actor: UserId) -> Result<Post, DomainError> {
        self.set_published(key, actor, PostAction::Publish, true).await
    }

    pub async fn unpublish(&self, key: &str, actor: UserId) -> Result<Post, DomainError> {
        self.set_published(key, actor, PostAction::Unpublish, false).await
    }

    pub async fn delete(&self, key: &str, actor: UserId) -> Result<(), DomainError> {
        let existing = self.posts.find_by_slug_or_id(key).await?;
        let post = self.guard.authorize(existing, key, actor, PostAction::Delete)?;
        Ok(self.posts.delete(post.id).await?)
    }

    /// Validate `raw_query` and search the published posts.
    pub async fn search(
        &self,
        raw_query: &str,
        settings: &BlogSettings,
    ) -> Result<Vec<Post>, DomainError> {
        let query = SearchQuery::parse(raw_query)?;
        self.engine
            .search(&query, self.posts.as_ref(), settings.content_source())
            .await
    }

    /// Published posts, newest first, with author names.
    pub async fn feed(&self) -> Result<Vec<FeedEntry>, DomainError> {
        let posts = self.list_published().await?;
        let mut names: HashMap<UserId, Option<String>> = HashMap::new();
        let mut entries = Vec::with_capacity(posts.len());

        for post in posts {
            let author_name = match names.get(&post.author_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .users
                        .find_by_id(post.author_id)
                        .await?
                        .map(|user| user.name);
                    names.insert(post.author_id, name.clone());
                    name
                }
            };
            entries.push(FeedEntry { post, author_name });
        }
        Ok(entries)
    }

    /// Count one read; run by the background worker.
    pub async fn record_view(&self, post_id: PostId) -> Result<(), DomainError> {
        Ok(self.posts.increment_views(post_id).await?)
    }

    async fn set_published(
        &self,
        key: &str,
        actor: UserId,
        action: PostAction,
        published: bool,
    ) -> Result<Post, DomainError> {
        let existing = self.posts.find_by_slug_or_id(key).await?;
        let mut post = self.guard.authorize(existing, key, actor, action)?;

        self.posts.set_published(post.id, published).await?;
        post.published = published;
        post.touch();
        Ok(post)
    }

    fn compose(&self, draft: PostDraft, settings: &BlogSettings) -> Result<PostContent, DomainError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("title is required".to_string()));
        }

        // markdown line breaks are significant; only editor HTML is cleaned up
        let (content, markdown) = if settings.markdown {
            let source = draft
                .markdown
                .filter(|markdown| !markdown.trim().is_empty())
                .unwrap_or(draft.content);
            (self.renderer.render(&source), Some(source))
        } else {
            (cleanup(&draft.content), None)
        };

        Ok(PostContent {
            excerpt: excerpt(&content),
            title,
            content,
            markdown,
        })
    }

    async fn unique_slug(&self, title: &str) -> Result<String, DomainError> {
        let base = match slugify(title) {
            slug if slug.is_empty() => "post".to_string(),
            slug => slug,
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while candidate == RESERVED_SLUG || self.posts.find_by_slug(&candidate).await?.is_some() {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }
        Ok(candidate)
    }
}
