use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = i64;

/// User entity - represents an author account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub recovery: Option<RecoveryToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user; the store assigns the id on first save.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name,
            email,
            password_hash,
            avatar: None,
            recovery: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One-time password recovery token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl RecoveryToken {
    /// Issue a fresh random token valid for `ttl`.
    pub fn issue(ttl: Duration) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when `candidate` is this token and it has not expired.
    pub fn accepts(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && self.token == candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_token_accepts_only_itself() {
        let token = RecoveryToken::issue(Duration::minutes(5));
        let now = Utc::now();

        assert!(token.accepts(&token.token, now));
        assert!(!token.accepts(&Uuid::new_v4().to_string(), now));
    }

    #[test]
    fn test_recovery_token_expires() {
        let token = RecoveryToken::issue(Duration::minutes(5));
        let later = Utc::now() + Duration::minutes(6);

        assert!(token.is_expired_at(later));
        assert!(!token.accepts(&token.token, later));
    }
}
