//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Admission control keyed by an opaque client string.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a request for `key` and decide whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateDecision, RateLimitError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }

    /// Whole seconds a limited client should wait, never zero.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateDecision::Allowed => None,
            RateDecision::Limited { retry_after } => Some(retry_after.as_secs().max(1)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limiter unavailable: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_rounds_up_to_one_second() {
        let limited = RateDecision::Limited {
            retry_after: Duration::from_millis(200),
        };
        assert!(!limited.is_allowed());
        assert_eq!(limited.retry_after_secs(), Some(1));
        assert_eq!(RateDecision::Allowed.retry_after_secs(), None);
    }
}
