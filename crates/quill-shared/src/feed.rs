//! JSON Feed 1.1 document types.
//!
//! See: https://www.jsonfeed.org/version/1.1/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

/// Media type of a JSON Feed document.
pub const JSON_FEED_CONTENT_TYPE: &str = "application/feed+json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFeed {
    pub version: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub items: Vec<FeedItem>,
}

impl JsonFeed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            version: JSON_FEED_VERSION.to_string(),
            title: title.into(),
            home_page_url: None,
            feed_url: None,
            description: None,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    pub content_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub date_published: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<FeedAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedAuthor {
    pub name: String,
}
