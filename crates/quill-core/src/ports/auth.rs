//! Authentication ports: sessions, tokens and password hashing.

use async_trait::async_trait;

use crate::domain::{User, UserId};

/// Claims carried by a session token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub email: String,
    /// Unique token id, used for revocation.
    pub token_id: String,
    pub exp: i64,
}

/// Token service trait for signed session tokens.
pub trait TokenService: Send + Sync {
    /// Generate a signed token for a user.
    fn generate_token(&self, user_id: UserId, email: &str) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of generated tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// The acting user, resolved from request-scoped session state.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub token_id: String,
    pub expires_at: i64,
}

impl From<TokenClaims> for Session {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            token_id: claims.token_id,
            expires_at: claims.exp,
        }
    }
}

/// A freshly issued session credential.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_in: u64,
}

/// Resolves raw session credentials into a [`Session`].
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn issue(&self, user: &User) -> Result<IssuedSession, AuthError>;

    /// Fails with `Unauthorized`-class errors when the session is absent,
    /// expired or revoked.
    async fn resolve(&self, token: &str) -> Result<Session, AuthError>;

    async fn revoke(&self, session: &Session) -> Result<(), AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
