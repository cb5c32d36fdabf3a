use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::authz::PostAuthorizationGuard;
use crate::domain::{BlogSettings, Post, RecoveryToken, User, UserId};
use crate::error::DomainError;
use crate::ports::{
    AuthError, BackgroundTask, Job, JobQueue, Mailer, OutgoingMail, PasswordService,
    PostRepository, UserRepository,
};

/// How long a recovery link stays valid.
pub const RECOVERY_TTL_MINUTES: i64 = 180;

pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A user with the posts the viewer is allowed to see.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub posts: Vec<Post>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    passwords: Arc<dyn PasswordService>,
    mailer: Arc<dyn Mailer>,
    jobs: Arc<dyn JobQueue>,
    guard: PostAuthorizationGuard,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        passwords: Arc<dyn PasswordService>,
        mailer: Arc<dyn Mailer>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            users,
            posts,
            passwords,
            mailer,
            jobs,
            guard: PostAuthorizationGuard,
        }
    }

    pub async fn register(
        &self,
        input: Registration,
        settings: &BlogSettings,
    ) -> Result<User, DomainError> {
        if !settings.allow_registrations {
            return Err(DomainError::Forbidden(
                "registrations are closed".to_string(),
            ));
        }

        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }
        let email = normalize_email(&input.email);
        if !email.contains('@') {
            return Err(DomainError::Validation("email is invalid".to_string()));
        }
        validate_password(&input.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate(format!(
                "user with email {} already exists",
                email
            )));
        }

        let hash = self.passwords.hash(&input.password).map_err(auth_failure)?;
        Ok(self
            .users
            .save(User::new(name.to_string(), email, hash))
            .await?)
    }

    /// Check credentials. Unknown email and wrong password are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(DomainError::Unauthorized)?;

        if self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(auth_failure)?
        {
            Ok(user)
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    pub async fn get(&self, id: UserId) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    pub async fn profile(&self, id: UserId, viewer: Option<UserId>) -> Result<Profile, DomainError> {
        let user = self.get(id).await?;
        let posts = self
            .posts
            .find_by_author(id)
            .await?
            .into_iter()
            .filter(|post| self.guard.is_visible_to(post, viewer))
            .collect();
        Ok(Profile { user, posts })
    }

    /// Every user with their published posts.
    pub async fn list(&self) -> Result<Vec<Profile>, DomainError> {
        let users = self.users.find_all().await?;
        let mut profiles = Vec::with_capacity(users.len());
        for user in users {
            let posts = self
                .posts
                .find_by_author(user.id)
                .await?
                .into_iter()
                .filter(|post| self.guard.is_searchable(post))
                .collect();
            profiles.push(Profile { user, posts });
        }
        Ok(profiles)
    }

    /// Issue a recovery token, mail the reset link and schedule its expiry.
    pub async fn recover(&self, email: &str, settings: &BlogSettings) -> Result<(), DomainError> {
        let mut user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let ttl = Duration::minutes(RECOVERY_TTL_MINUTES);
        let recovery = RecoveryToken::issue(ttl);
        let link = settings.reset_url(user.id, &recovery.token);
        user.recovery = Some(recovery.clone());
        user.updated_at = Utc::now();
        let user = self.users.save(user).await?;

        let mail = OutgoingMail {
            from: format!("{} <postmaster@{}>", settings.name, settings.mailer.domain),
            to: user.email.clone(),
            subject: format!("Password reset for {}", settings.name),
            body: format!(
                "Somebody (hopefully you) requested a password reset for your account on {}.\n\
                 Use the link below within {} hours to choose a new password:\n\n{}\n",
                settings.name,
                RECOVERY_TTL_MINUTES / 60,
                link
            ),
        };
        self.mailer
            .send(&settings.mailer, mail)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        // the periodic sweep clears tokens whose expiry job never ran
        let _ = self
            .jobs
            .enqueue(
                Job::new(BackgroundTask::ExpireRecovery {
                    user_id: user.id,
                    token: recovery.token,
                })
                .delayed(ttl),
            )
            .await;
        Ok(())
    }

    pub async fn reset_password(
        &self,
        user_id: UserId,
        token: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let mut user = self.get(user_id).await?;

        if Uuid::parse_str(token).is_err() {
            return Err(DomainError::Validation(
                "recovery token is malformed".to_string(),
            ));
        }
        let accepted = user
            .recovery
            .as_ref()
            .is_some_and(|recovery| recovery.accepts(token, Utc::now()));
        if !accepted {
            return Err(DomainError::Unauthorized);
        }
        validate_password(password)?;

        user.password_hash = self.passwords.hash(password).map_err(auth_failure)?;
        user.recovery = None;
        user.updated_at = Utc::now();
        Ok(self.users.save(user).await?)
    }

    /// Clear `token` if it is still the user's current recovery token.
    /// Returns whether anything changed.
    pub async fn expire_recovery(&self, user_id: UserId, token: &str) -> Result<bool, DomainError> {
        let Some(mut user) = self.users.find_by_id(user_id).await? else {
            return Ok(false);
        };
        if user.recovery.as_ref().is_none_or(|recovery| recovery.token != token) {
            return Ok(false);
        }
        user.recovery = None;
        user.updated_at = Utc::now();
        self.users.save(user).await?;
        Ok(true)
    }

    pub async fn sweep_expired_recoveries(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        Ok(self.users.clear_expired_recoveries(now).await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

fn auth_failure(err: AuthError) -> DomainError {
    DomainError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        InMemoryPosts, InMemoryUsers, PlainPasswords, RecordingJobs, RecordingMailer, post, user,
    };

    struct Fixture {
        users: Arc<InMemoryUsers>,
        mailer: Arc<RecordingMailer>,
        jobs: Arc<RecordingJobs>,
        service: UserService,
    }

    fn fixture(users: Vec<User>, posts: Vec<Post>) -> Fixture {
        let users = Arc::new(InMemoryUsers::with(users));
        let mailer = Arc::new(RecordingMailer::default());
        let jobs = Arc::new(RecordingJobs::default());
        let service = UserService::new(
            users.clone(),
            Arc::new(InMemoryPosts::with(posts)),
            Arc::new(PlainPasswords),
            mailer.clone(),
            jobs.clone(),
        );
        Fixture {
            users,
            mailer,
            jobs,
            service,
        }
    }

    fn open() -> BlogSettings {
        BlogSettings {
            name: "Quill".to_string(),
            hostname: "https://blog.example.com".to_string(),
            allow_registrations: true,
            ..BlogSettings::default()
        }
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let f = fixture(vec![], vec![]);

        let created = f
            .service
            .register(registration(" Ada@Example.com ", "correct horse"), &open())
            .await
            .unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert_eq!(created.password_hash, "hashed:correct horse");

        let logged_in = f
            .service
            .login("ada@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn test_register_rules() {
        let f = fixture(vec![user(1, "taken@example.com")], vec![]);

        let closed = BlogSettings::default();
        assert!(matches!(
            f.service.register(registration("a@b.c", "long enough"), &closed).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.register(registration("nope", "long enough"), &open()).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            f.service.register(registration("a@b.c", "short"), &open()).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            f.service
                .register(registration("taken@example.com", "long enough"), &open())
                .await,
            Err(DomainError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let f = fixture(vec![user(1, "ada@example.com")], vec![]);

        assert!(matches!(
            f.service.login("ghost@example.com", "password").await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            f.service.login("ada@example.com", "wrong").await,
            Err(DomainError::Unauthorized)
        ));
        assert!(f.service.login("ada@example.com", "password").await.is_ok());
    }

    #[tokio::test]
    async fn test_profile_respects_draft_visibility() {
        let mut public = post(1, 1, "Public", "body");
        public.published = true;
        let draft = post(2, 1, "Draft", "body");
        let f = fixture(vec![user(1, "ada@example.com")], vec![public, draft]);

        assert_eq!(f.service.profile(1, None).await.unwrap().posts.len(), 1);
        assert_eq!(f.service.profile(1, Some(1)).await.unwrap().posts.len(), 2);
        assert!(matches!(
            f.service.profile(9, None).await,
            Err(DomainError::NotFound { entity_type: "user", .. })
        ));

        let listed = f.service.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].posts.len(), 1);
    }

    #[tokio::test]
    async fn test_recover_mails_link_and_schedules_expiry() {
        let f = fixture(vec![user(1, "ada@example.com")], vec![]);

        f.service.recover("ada@example.com", &open()).await.unwrap();

        let stored = f.users.get(1).unwrap();
        let recovery = stored.recovery.unwrap();
        let sent = f.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert!(sent[0].body.contains(&format!(
            "https://blog.example.com/user/reset/1/{}",
            recovery.token
        )));

        let jobs = f.jobs.jobs.lock().unwrap();
        assert_eq!(
            jobs[0].task,
            BackgroundTask::ExpireRecovery {
                user_id: 1,
                token: recovery.token.clone()
            }
        );
        assert!(jobs[0].scheduled_at.is_some());
    }

    #[tokio::test]
    async fn test_recover_unknown_email() {
        let f = fixture(vec![], vec![]);
        assert!(matches!(
            f.service.recover("ghost@example.com", &open()).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(f.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let f = fixture(vec![user(1, "ada@example.com")], vec![]);
        f.service.recover("ada@example.com", &open()).await.unwrap();
        let token = f.users.get(1).unwrap().recovery.unwrap().token;

        assert!(matches!(
            f.service.reset_password(9, &token, "new password").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            f.service.reset_password(1, "not-a-uuid", "new password").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            f.service
                .reset_password(1, &Uuid::new_v4().to_string(), "new password")
                .await,
            Err(DomainError::Unauthorized)
        ));

        let updated = f.service.reset_password(1, &token, "new password").await.unwrap();
        assert_eq!(updated.password_hash, "hashed:new password");
        assert!(updated.recovery.is_none());

        // one-time use
        assert!(matches!(
            f.service.reset_password(1, &token, "another one").await,
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_and_swept() {
        let mut stale = user(1, "ada@example.com");
        let mut recovery = RecoveryToken::issue(Duration::minutes(5));
        recovery.expires_at = Utc::now() - Duration::minutes(1);
        let token = recovery.token.clone();
        stale.recovery = Some(recovery);
        let f = fixture(vec![stale], vec![]);

        assert!(matches!(
            f.service.reset_password(1, &token, "new password").await,
            Err(DomainError::Unauthorized)
        ));
        assert_eq!(f.service.sweep_expired_recoveries(Utc::now()).await.unwrap(), 1);
        assert!(f.users.get(1).unwrap().recovery.is_none());
    }

    #[tokio::test]
    async fn test_expire_recovery_only_clears_matching_token() {
        let f = fixture(vec![user(1, "ada@example.com")], vec![]);
        f.service.recover("ada@example.com", &open()).await.unwrap();
        let token = f.users.get(1).unwrap().recovery.unwrap().token;

        assert!(!f.service.expire_recovery(1, "stale-token").await.unwrap());
        assert!(!f.service.expire_recovery(7, &token).await.unwrap());
        assert!(f.service.expire_recovery(1, &token).await.unwrap());
        assert!(f.users.get(1).unwrap().recovery.is_none());
    }
}
