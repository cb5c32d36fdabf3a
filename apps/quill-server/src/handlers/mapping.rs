//! Domain values to and from API bodies.

use quill_core::domain::{BlogSettings, MailerSettings, Post, User};
use quill_core::ports::{IssuedSession, QueueStats};
use quill_core::service::{FeedEntry, PostDraft, Profile, Registration, SettingsUpdate};
use quill_shared::dto::{
    AuthResponse, JobStatsResponse, MailerSettingsDto, PostRequest, PostResponse,
    ProfileResponse, RegisterUserRequest, SettingsDto, UserResponse,
};
use quill_shared::feed::{FeedAuthor, FeedItem, JsonFeed};

pub fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        markdown: post.markdown,
        excerpt: post.excerpt,
        published: post.published,
        view_count: post.view_count,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn post_responses(posts: Vec<Post>) -> Vec<PostResponse> {
    posts.into_iter().map(post_response).collect()
}

/// Public view of a user; the password hash and recovery token never leave.
pub fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        avatar: user.avatar,
        created_at: user.created_at,
    }
}

pub fn profile_response(profile: Profile) -> ProfileResponse {
    ProfileResponse {
        user: user_response(profile.user),
        posts: post_responses(profile.posts),
    }
}

pub fn auth_response(session: IssuedSession, user: User) -> AuthResponse {
    AuthResponse {
        access_token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in,
        user: user_response(user),
    }
}

pub fn post_draft(body: PostRequest) -> PostDraft {
    PostDraft {
        title: body.title,
        content: body.content,
        markdown: body.markdown,
    }
}

pub fn registration(body: RegisterUserRequest) -> Registration {
    Registration {
        name: body.name,
        email: body.email,
        password: body.password,
    }
}

pub fn settings_dto(settings: BlogSettings) -> SettingsDto {
    SettingsDto {
        name: settings.name,
        hostname: settings.hostname,
        description: settings.description,
        allow_registrations: settings.allow_registrations,
        markdown: settings.markdown,
        first_run: settings.first_run,
        mailer: MailerSettingsDto {
            domain: settings.mailer.domain,
            private_key: settings.mailer.private_key,
        },
        disqus: settings.disqus,
        google_analytics: settings.google_analytics,
    }
}

/// `first_run` in the body is ignored; the service owns it.
pub fn settings_update(body: SettingsDto) -> SettingsUpdate {
    SettingsUpdate {
        name: body.name,
        hostname: body.hostname,
        description: body.description,
        allow_registrations: body.allow_registrations,
        markdown: body.markdown,
        mailer: MailerSettings {
            domain: body.mailer.domain,
            private_key: body.mailer.private_key,
        },
        disqus: body.disqus,
        google_analytics: body.google_analytics,
    }
}

pub fn job_stats(stats: QueueStats) -> JobStatsResponse {
    JobStatsResponse {
        pending: stats.pending,
        processing: stats.processing,
        completed: stats.completed,
        failed: stats.failed,
    }
}

/// JSON Feed document for the published posts.
pub fn json_feed(settings: &BlogSettings, entries: Vec<FeedEntry>) -> JsonFeed {
    let mut feed = JsonFeed::new(settings.name.clone());
    if !settings.hostname.is_empty() {
        let base = settings.hostname.trim_end_matches('/');
        feed.home_page_url = Some(base.to_string());
        feed.feed_url = Some(format!("{}/api/feed", base));
    }
    if !settings.description.is_empty() {
        feed.description = Some(settings.description.clone());
    }

    feed.items = entries
        .into_iter()
        .map(|entry| {
            let post = entry.post;
            FeedItem {
                id: settings.feed_item_id(post.id),
                url: Some(settings.post_url(&post.slug)),
                title: post.title,
                content_html: post.content,
                summary: Some(post.excerpt).filter(|s| !s.is_empty()),
                date_published: post.created_at,
                date_modified: post.updated_at,
                authors: entry
                    .author_name
                    .map(|name| vec![FeedAuthor { name }])
                    .unwrap_or_default(),
            }
        })
        .collect();
    feed
}
