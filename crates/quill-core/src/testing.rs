//! In-process doubles for the ports, shared by the unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BlogSettings, MailerSettings, Post, PostContent, PostId, User, UserId};
use crate::domain::text::slugify;
use crate::error::RepoError;
use crate::ports::{
    AuthError, BaseRepository, ContentRenderer, Job, JobHandler, JobQueue, JobQueueError,
    MailError, Mailer, OutgoingMail, PasswordService, PostRepository, QueueStats, SettingsStore,
    UserRepository,
};

pub fn post(id: PostId, author_id: UserId, title: &str, content: &str) -> Post {
    let mut post = Post::draft(
        author_id,
        title.to_string(),
        slugify(title),
        content.to_string(),
        None,
        String::new(),
    );
    post.id = id;
    post
}

pub fn user(id: UserId, email: &str) -> User {
    let mut user = User::new(
        email.split('@').next().unwrap_or_default().to_string(),
        email.to_string(),
        "hashed:password".to_string(),
    );
    user.id = id;
    user
}

type ReadHook = Box<dyn FnOnce(&mut Vec<Post>) + Send>;

/// Post store over a vector; `find_all` keeps insertion order.
#[derive(Default)]
pub struct InMemoryPosts {
    posts: Mutex<Vec<Post>>,
    next_id: AtomicI64,
    failure: Option<String>,
    after_read: Mutex<Option<ReadHook>>,
}

impl InMemoryPosts {
    pub fn with(posts: Vec<Post>) -> Self {
        let next = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            posts: Mutex::new(posts),
            next_id: AtomicI64::new(next),
            failure: None,
            after_read: Mutex::new(None),
        }
    }

    /// Mutate the stored posts right after the next slug lookup returns,
    /// as another request would between a read and a write.
    pub fn after_next_read(&self, hook: impl FnOnce(&mut Vec<Post>) + Send + 'static) {
        *self.after_read.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), RepoError> {
        match &self.failure {
            Some(message) => Err(RepoError::Connection(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BaseRepository<Post, PostId> for InMemoryPosts {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        self.check()?;
        Ok(self.snapshot().into_iter().find(|p| p.id == id))
    }

    async fn save(&self, mut entity: Post) -> Result<Post, RepoError> {
        self.check()?;
        let mut posts = self.posts.lock().unwrap();
        if entity.id == 0 {
            entity.id = self.next_id.fetch_add(1, Ordering::SeqCst).max(1);
            posts.push(entity.clone());
        } else if let Some(slot) = posts.iter_mut().find(|p| p.id == entity.id) {
            *slot = entity.clone();
        } else {
            posts.push(entity.clone());
        }
        Ok(entity)
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        self.check()?;
        self.posts.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        self.check()?;
        Ok(self.snapshot())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.check()?;
        let found = self.snapshot().into_iter().find(|p| p.slug == slug);
        if let Some(hook) = self.after_read.lock().unwrap().take() {
            hook(&mut self.posts.lock().unwrap());
        }
        Ok(found)
    }

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepoError> {
        self.check()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|p| p.author_id == author_id)
            .collect())
    }

    async fn set_published(&self, id: PostId, published: bool) -> Result<(), RepoError> {
        self.check()?;
        let mut posts = self.posts.lock().unwrap();
        let post = posts.iter_mut().find(|p| p.id == id).ok_or(RepoError::NotFound)?;
        post.published = published;
        Ok(())
    }

    async fn increment_views(&self, id: PostId) -> Result<(), RepoError> {
        self.check()?;
        let mut posts = self.posts.lock().unwrap();
        let post = posts.iter_mut().find(|p| p.id == id).ok_or(RepoError::NotFound)?;
        post.view_count += 1;
        Ok(())
    }

    async fn update_content(&self, id: PostId, edit: PostContent) -> Result<Post, RepoError> {
        self.check()?;
        let mut posts = self.posts.lock().unwrap();
        let post = posts.iter_mut().find(|p| p.id == id).ok_or(RepoError::NotFound)?;
        post.apply_content(edit);
        Ok(post.clone())
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
    next_id: AtomicI64,
}

impl InMemoryUsers {
    pub fn with(users: Vec<User>) -> Self {
        let next = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Self {
            users: Mutex::new(users),
            next_id: AtomicI64::new(next),
        }
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl BaseRepository<User, UserId> for InMemoryUsers {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.get(id))
    }

    async fn save(&self, mut entity: User) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if entity.id == 0 {
            entity.id = self.next_id.fetch_add(1, Ordering::SeqCst).max(1);
            users.push(entity.clone());
        } else if let Some(slot) = users.iter_mut().find(|u| u.id == entity.id) {
            *slot = entity.clone();
        } else {
            users.push(entity.clone());
        }
        Ok(entity)
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn clear_expired_recoveries(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut cleared = 0;
        for user in self.users.lock().unwrap().iter_mut() {
            if user.recovery.as_ref().is_some_and(|r| r.is_expired_at(now)) {
                user.recovery = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

/// Records enqueued jobs without running them.
#[derive(Default)]
pub struct RecordingJobs {
    pub jobs: Mutex<Vec<Job>>,
}

#[async_trait]
impl JobQueue for RecordingJobs {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }

    async fn start_worker(&self, _handler: JobHandler) -> Result<(), JobQueueError> {
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.jobs.lock().unwrap().len(),
            ..QueueStats::default()
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, _credentials: &MailerSettings, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Reversible "hash" so tests can assert on stored values.
pub struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("hashed:{}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("hashed:{}", password))
    }
}

pub struct ParagraphRenderer;

impl ContentRenderer for ParagraphRenderer {
    fn render(&self, source: &str) -> String {
        format!("<p>{}</p>", source)
    }
}

#[derive(Default)]
pub struct MemorySettings {
    settings: Mutex<BlogSettings>,
}

impl MemorySettings {
    pub fn with(settings: BlogSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    pub fn current(&self) -> BlogSettings {
        self.settings.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    /// Yields after reading so a concurrent caller can read the same state.
    async fn load(&self) -> Result<BlogSettings, RepoError> {
        let settings = self.current();
        tokio::task::yield_now().await;
        Ok(settings)
    }

    async fn save(&self, settings: BlogSettings) -> Result<(), RepoError> {
        *self.settings.lock().unwrap() = settings;
        Ok(())
    }

    async fn save_if_first_run(&self, settings: BlogSettings) -> Result<bool, RepoError> {
        let mut current = self.settings.lock().unwrap();
        if !current.first_run {
            return Ok(false);
        }
        *current = settings;
        Ok(true)
    }
}
