//! In-memory stores - used when no database is configured.
//!
//! Data is lost on process restart.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use quill_core::domain::{BlogSettings, Post, PostContent, PostId, User, UserId};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, SettingsStore, UserRepository};

/// Posts keyed by id behind an async RwLock. Slugs are unique.
pub struct InMemoryPostRepository {
    posts: RwLock<BTreeMap<PostId, Post>>,
    next_id: AtomicI64,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Post, PostId> for InMemoryPostRepository {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn save(&self, mut entity: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;

        let slug_taken = posts
            .values()
            .any(|p| p.slug == entity.slug && p.id != entity.id);
        if slug_taken {
            return Err(RepoError::Constraint(format!(
                "slug {} already exists",
                entity.slug
            )));
        }

        if !entity.is_persisted() {
            entity.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        }
        posts.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        match self.posts.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        let mut all: Vec<Post> = self.posts.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn set_published(&self, id: PostId, published: bool) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.published = published;
        post.touch();
        Ok(())
    }

    async fn increment_views(&self, id: PostId) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.view_count += 1;
        Ok(())
    }

    async fn update_content(&self, id: PostId, edit: PostContent) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.apply_content(edit);
        Ok(post.clone())
    }
}

/// Users keyed by id behind an async RwLock. Emails are unique.
pub struct InMemoryUserRepository {
    users: RwLock<BTreeMap<UserId, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, UserId> for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn save(&self, mut entity: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;

        let email_taken = users
            .values()
            .any(|u| u.email == entity.email && u.id != entity.id);
        if email_taken {
            return Err(RepoError::Constraint("email already exists".to_string()));
        }

        if entity.id == 0 {
            entity.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        }
        users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        match self.users.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn clear_expired_recoveries(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut cleared = 0;
        for user in self.users.write().await.values_mut() {
            if user.recovery.as_ref().is_some_and(|r| r.is_expired_at(now)) {
                user.recovery = None;
                user.updated_at = now;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

/// Settings document held in memory; starts in first-run state.
pub struct InMemorySettingsStore {
    settings: RwLock<BlogSettings>,
}

impl InMemorySettingsStore {
    pub fn new(initial: BlogSettings) -> Self {
        Self {
            settings: RwLock::new(initial),
        }
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new(BlogSettings::first_run())
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> Result<BlogSettings, RepoError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: BlogSettings) -> Result<(), RepoError> {
        *self.settings.write().await = settings;
        Ok(())
    }

    async fn save_if_first_run(&self, settings: BlogSettings) -> Result<bool, RepoError> {
        let mut current = self.settings.write().await;
        if !current.first_run {
            return Ok(false);
        }
        *current = settings;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quill_core::domain::RecoveryToken;

    fn draft(slug: &str) -> Post {
        Post::draft(
            1,
            "Title".to_string(),
            slug.to_string(),
            "body".to_string(),
            None,
            "body".to_string(),
        )
    }

    #[tokio::test]
    async fn test_save_assigns_ids_and_updates() {
        let repo = InMemoryPostRepository::new();

        let first = repo.save(draft("one")).await.unwrap();
        let second = repo.save(draft("two")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let mut edited = first.clone();
        edited.title = "Edited".to_string();
        repo.save(edited).await.unwrap();

        let stored: Option<Post> = repo.find_by_id(1).await.unwrap();
        assert_eq!(stored.unwrap().title, "Edited");
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = InMemoryPostRepository::new();
        repo.save(draft("same")).await.unwrap();

        assert!(matches!(
            repo.save(draft("same")).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let repo = InMemoryPostRepository::new();
        let mut old = draft("old");
        old.created_at = Utc::now() - Duration::days(1);
        repo.save(old).await.unwrap();
        repo.save(draft("new-post")).await.unwrap();

        let slugs: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, vec!["new-post", "old"]);
    }

    #[tokio::test]
    async fn test_publish_and_views() {
        let repo = InMemoryPostRepository::new();
        let post = repo.save(draft("p")).await.unwrap();

        repo.set_published(post.id, true).await.unwrap();
        repo.increment_views(post.id).await.unwrap();

        let stored = repo.find_by_slug("p").await.unwrap().unwrap();
        assert!(stored.published);
        assert_eq!(stored.view_count, 1);
        assert!(matches!(
            repo.set_published(99, true).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_content_leaves_state_alone() {
        let repo = InMemoryPostRepository::new();
        let post = repo.save(draft("p")).await.unwrap();
        repo.set_published(post.id, true).await.unwrap();
        repo.increment_views(post.id).await.unwrap();

        let edit = PostContent {
            title: "Retitled".to_string(),
            content: "<p>new</p>".to_string(),
            markdown: None,
            excerpt: "new".to_string(),
        };
        let updated = repo.update_content(post.id, edit.clone()).await.unwrap();

        assert_eq!(updated.title, "Retitled");
        assert_eq!(updated.slug, "p");
        assert!(updated.published);
        assert_eq!(updated.view_count, 1);

        repo.delete(post.id).await.unwrap();
        assert!(matches!(
            repo.update_content(post.id, edit).await,
            Err(RepoError::NotFound)
        ));
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_run_save_happens_once() {
        let store = InMemorySettingsStore::default();
        let installed = BlogSettings {
            name: "First".to_string(),
            ..BlogSettings::default()
        };

        assert!(store.save_if_first_run(installed.clone()).await.unwrap());
        let late = BlogSettings {
            name: "Second".to_string(),
            ..BlogSettings::default()
        };
        assert!(!store.save_if_first_run(late).await.unwrap());
        assert_eq!(store.load().await.unwrap(), installed);
    }

    #[tokio::test]
    async fn test_clear_expired_recoveries() {
        let repo = InMemoryUserRepository::new();
        let mut expired = User::new("A".into(), "a@example.com".into(), "h".into());
        expired.recovery = Some(RecoveryToken::issue(Duration::minutes(-1)));
        let mut valid = User::new("B".into(), "b@example.com".into(), "h".into());
        valid.recovery = Some(RecoveryToken::issue(Duration::minutes(30)));
        let expired = repo.save(expired).await.unwrap();
        let valid = repo.save(valid).await.unwrap();

        assert_eq!(repo.clear_expired_recoveries(Utc::now()).await.unwrap(), 1);

        let expired: Option<User> = repo.find_by_id(expired.id).await.unwrap();
        let valid: Option<User> = repo.find_by_id(valid.id).await.unwrap();
        assert!(expired.unwrap().recovery.is_none());
        assert!(valid.unwrap().recovery.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.save(User::new("A".into(), "a@example.com".into(), "h".into()))
            .await
            .unwrap();

        assert!(matches!(
            repo.save(User::new("B".into(), "a@example.com".into(), "h".into()))
                .await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_settings_store_starts_at_first_run() {
        let store = InMemorySettingsStore::default();
        assert!(store.load().await.unwrap().first_run);

        store.save(BlogSettings::default()).await.unwrap();
        assert!(!store.load().await.unwrap().first_run);
    }
}
