//! Post visibility and ownership rules.
//!
//! Every mutation path goes through [`PostAuthorizationGuard::authorize`], so
//! edit, publish, unpublish and delete cannot drift apart.

use crate::domain::{Post, UserId};
use crate::error::DomainError;

/// A mutation an actor wants to perform on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Edit,
    Publish,
    Unpublish,
    Delete,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostAuthorizationGuard;

impl PostAuthorizationGuard {
    /// Only published posts take part in search and feeds.
    pub fn is_searchable(&self, post: &Post) -> bool {
        post.published
    }

    /// Drafts are readable by their author only.
    pub fn is_visible_to(&self, post: &Post, viewer: Option<UserId>) -> bool {
        post.published || viewer == Some(post.author_id)
    }

    pub fn can_mutate(&self, post: &Post, actor: UserId) -> bool {
        post.author_id == actor
    }

    pub fn can_publish(&self, post: &Post, actor: UserId) -> bool {
        self.can_mutate(post, actor)
    }

    pub fn can_unpublish(&self, post: &Post, actor: UserId) -> bool {
        self.can_mutate(post, actor)
    }

    pub fn can_delete(&self, post: &Post, actor: UserId) -> bool {
        self.can_mutate(post, actor)
    }

    pub fn permits(&self, post: &Post, actor: UserId, action: PostAction) -> bool {
        match action {
            PostAction::Edit => self.can_mutate(post, actor),
            PostAction::Publish => self.can_publish(post, actor),
            PostAction::Unpublish => self.can_unpublish(post, actor),
            PostAction::Delete => self.can_delete(post, actor),
        }
    }

    /// Check a freshly fetched post. A missing post is `NotFound` before any
    /// ownership comparison happens.
    pub fn authorize(
        &self,
        post: Option<Post>,
        key: &str,
        actor: UserId,
        action: PostAction,
    ) -> Result<Post, DomainError> {
        let post = post.ok_or_else(|| DomainError::post_not_found(key))?;
        if self.permits(&post, actor, action) {
            Ok(post)
        } else {
            Err(DomainError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::post;

    const ACTIONS: [PostAction; 4] = [
        PostAction::Edit,
        PostAction::Publish,
        PostAction::Unpublish,
        PostAction::Delete,
    ];

    #[test]
    fn test_only_author_may_mutate() {
        let guard = PostAuthorizationGuard;
        let post = post(2, 3, "Owned", "body");

        for action in ACTIONS {
            assert!(guard.permits(&post, 3, action));
            for other in [0, 1, 4, 5, -3] {
                assert!(!guard.permits(&post, other, action));
            }
        }
    }

    #[test]
    fn test_delete_by_stranger_is_unauthorized() {
        let guard = PostAuthorizationGuard;
        let post = post(2, 3, "Owned", "body");

        let err = guard
            .authorize(Some(post.clone()), "2", 5, PostAction::Delete)
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));

        let allowed = guard.authorize(Some(post), "2", 3, PostAction::Delete).unwrap();
        assert_eq!(allowed.id, 2);
    }

    #[test]
    fn test_missing_post_is_not_found_for_everyone() {
        let guard = PostAuthorizationGuard;
        for action in ACTIONS {
            let err = guard.authorize(None, "ghost", 5, action).unwrap_err();
            assert!(matches!(err, DomainError::NotFound { entity_type: "post", .. }));
        }
    }

    #[test]
    fn test_visibility() {
        let guard = PostAuthorizationGuard;
        let mut draft = post(1, 3, "Draft", "body");

        assert!(!guard.is_searchable(&draft));
        assert!(guard.is_visible_to(&draft, Some(3)));
        assert!(!guard.is_visible_to(&draft, Some(4)));
        assert!(!guard.is_visible_to(&draft, None));

        draft.published = true;
        assert!(guard.is_searchable(&draft));
        assert!(guard.is_visible_to(&draft, None));
    }
}
