//! RSS 2.0 and Atom documents for the published posts.

use atom_syndication::{Entry, Feed, Link, Person, Text};
use chrono::Utc;
use rss::{Channel, Guid, Item};

use quill_core::domain::BlogSettings;
use quill_core::service::FeedEntry;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

fn home_url(settings: &BlogSettings) -> String {
    match settings.hostname.trim_end_matches('/') {
        "" => "/".to_string(),
        base => base.to_string(),
    }
}

pub fn rss_channel(settings: &BlogSettings, entries: &[FeedEntry]) -> Channel {
    let items: Vec<Item> = entries
        .iter()
        .map(|entry| {
            let post = &entry.post;
            let url = settings.post_url(&post.slug);

            let mut guid = Guid::default();
            guid.set_value(url.clone());
            guid.set_permalink(true);

            let mut item = Item::default();
            item.set_title(post.title.clone());
            item.set_link(url);
            item.set_description(post.excerpt.clone());
            item.set_author(entry.author_name.clone());
            item.set_pub_date(post.created_at.to_rfc2822());
            item.set_guid(guid);
            item
        })
        .collect();

    let mut channel = Channel::default();
    channel.set_title(settings.name.clone());
    channel.set_link(home_url(settings));
    channel.set_description(settings.description.clone());
    channel.set_last_build_date(Utc::now().to_rfc2822());
    channel.set_items(items);
    channel
}

pub fn atom_feed(settings: &BlogSettings, entries: &[FeedEntry]) -> Feed {
    let home = home_url(settings);
    let updated = entries
        .iter()
        .map(|entry| entry.post.updated_at)
        .max()
        .unwrap_or_else(Utc::now);

    let atom_entries: Vec<Entry> = entries
        .iter()
        .map(|entry| {
            let post = &entry.post;
            let url = settings.post_url(&post.slug);

            let mut link = Link::default();
            link.set_href(url.clone());

            let mut atom_entry = Entry::default();
            atom_entry.set_title(post.title.clone());
            atom_entry.set_id(url);
            atom_entry.set_links(vec![link]);
            atom_entry.set_summary(Some(Text::plain(post.excerpt.clone())));
            atom_entry.set_published(Some(post.created_at.fixed_offset()));
            atom_entry.set_updated(post.updated_at.fixed_offset());
            if let Some(name) = &entry.author_name {
                let mut author = Person::default();
                author.set_name(name.clone());
                atom_entry.set_authors(vec![author]);
            }
            atom_entry
        })
        .collect();

    let mut link = Link::default();
    link.set_href(home.clone());

    let mut feed = Feed::default();
    feed.set_title(settings.name.clone());
    feed.set_id(home);
    feed.set_links(vec![link]);
    if !settings.description.is_empty() {
        feed.set_subtitle(Some(Text::plain(settings.description.clone())));
    }
    feed.set_updated(updated.fixed_offset());
    feed.set_entries(atom_entries);
    feed
}
