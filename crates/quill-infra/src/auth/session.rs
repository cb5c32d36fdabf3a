//! Bearer-token sessions with server-side revocation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use quill_core::domain::User;
use quill_core::ports::{AuthError, IssuedSession, Session, SessionProvider, TokenService};

/// Sessions carried in signed tokens. Logging out records the token id in a
/// denylist until the token would have expired anyway.
pub struct JwtSessionProvider {
    tokens: Arc<dyn TokenService>,
    revoked: RwLock<HashMap<String, i64>>,
}

impl JwtSessionProvider {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self {
            tokens,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    pub async fn revoked_count(&self) -> usize {
        self.revoked.read().await.len()
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn issue(&self, user: &User) -> Result<IssuedSession, AuthError> {
        let token = self.tokens.generate_token(user.id, &user.email)?;
        Ok(IssuedSession {
            token,
            expires_in: self.tokens.expiration_seconds().max(0) as u64,
        })
    }

    async fn resolve(&self, token: &str) -> Result<Session, AuthError> {
        let claims = self.tokens.validate_token(token)?;
        if self.revoked.read().await.contains_key(&claims.token_id) {
            return Err(AuthError::TokenRevoked);
        }
        Ok(claims.into())
    }

    async fn revoke(&self, session: &Session) -> Result<(), AuthError> {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(session.token_id.clone(), session.expires_at);
        tracing::debug!(user_id = session.user_id, "Session revoked");
        Ok(())
    }
}
