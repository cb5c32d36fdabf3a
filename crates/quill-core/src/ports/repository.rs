use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Post, PostContent, PostId, User, UserId};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, UserId> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_all(&self) -> Result<Vec<User>, RepoError>;

    /// Drop recovery tokens that expired before `now`; returns how many were cleared.
    async fn clear_expired_recoveries(&self, now: DateTime<Utc>) -> Result<u64, RepoError>;
}

/// Post store.
///
/// `find_all` returns every post in any state, newest first; each call is a
/// fresh snapshot.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, PostId> {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepoError>;

    async fn set_published(&self, id: PostId, published: bool) -> Result<(), RepoError>;

    async fn increment_views(&self, id: PostId) -> Result<(), RepoError>;

    /// Overwrite only the editable columns of an existing post and return the
    /// current row. `NotFound` when the post is gone.
    async fn update_content(&self, id: PostId, edit: PostContent) -> Result<Post, RepoError>;

    /// Resolve a route key: slug first, then numeric id.
    async fn find_by_slug_or_id(&self, key: &str) -> Result<Option<Post>, RepoError> {
        if let Some(post) = self.find_by_slug(key).await? {
            return Ok(Some(post));
        }
        match key.parse::<PostId>() {
            Ok(id) => self.find_by_id(id).await,
            Err(_) => Ok(None),
        }
    }
}
