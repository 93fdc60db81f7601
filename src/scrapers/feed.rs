//! Blog migration from an RSS 2.0 feed.
//!
//! Items are deserialized with `quick-xml`'s serde support and mapped into
//! [`FeedPost`]s. Posts already present in the output file (matched by slug)
//! are skipped, so re-running the job only appends what is new.

use crate::config::FeedConfig;
use crate::fetch::FetchAsync;
use crate::models::FeedPost;
use crate::outcome::{Outcome, SkipReason};
use crate::utils::{last_path_segment, slugify_title, truncate_for_log};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

static FIRST_IMG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]+src="([^">]+)""#).expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<FeedItem>,
}

/// Raw `<item>` as it appears in the feed.
#[derive(Debug, Default, Deserialize)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    /// `<content:encoded>`; matched by local name.
    #[serde(rename = "encoded")]
    pub content: Option<String>,
    pub description: Option<String>,
}

/// Parse all `<item>`s of an RSS document.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, Box<dyn Error>> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss.channel.items)
}

/// Map one feed item into a post; `now` is used when the date is missing or invalid.
pub fn to_post(
    item: &FeedItem,
    now: DateTime<Utc>,
    excerpt_chars: usize,
) -> Result<FeedPost, SkipReason> {
    let title = non_empty(item.title.as_deref()).ok_or(SkipReason::MissingTitle)?;
    let link = non_empty(item.link.as_deref()).ok_or(SkipReason::MissingLink)?;

    let slug = Url::parse(link)
        .ok()
        .and_then(|url| last_path_segment(&url))
        .unwrap_or_else(|| slugify_title(title));

    let date = item
        .pub_date
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc2822(raw.trim()).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now);

    let content = item
        .content
        .clone()
        .or_else(|| item.description.clone())
        .unwrap_or_default();
    let image = FIRST_IMG.captures(&content).map(|c| c[1].to_string());

    let excerpt = match item.description.as_deref() {
        Some(description) => {
            let plain = TAG.replace_all(description, "");
            let head: String = plain.chars().take(excerpt_chars).collect();
            format!("{head}...")
        }
        None => String::new(),
    };

    Ok(FeedPost {
        title: title.to_string(),
        slug,
        date: date.to_rfc3339(),
        content,
        image,
        excerpt,
        created_at: date.to_rfc3339(),
        is_published: true,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Turn feed items into posts, skipping those whose slug is already known.
///
/// `known_slugs` is updated with every accepted post.
pub fn collect_posts(
    items: &[FeedItem],
    known_slugs: &mut HashSet<String>,
    now: DateTime<Utc>,
    excerpt_chars: usize,
) -> Vec<Outcome<FeedPost>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let label = item
                .link
                .clone()
                .or_else(|| item.title.clone())
                .unwrap_or_else(|| format!("item #{i}"));
            match to_post(item, now, excerpt_chars) {
                Ok(post) if known_slugs.contains(&post.slug) => {
                    debug!(slug = %post.slug, "Already migrated");
                    Outcome::skipped(label, SkipReason::AlreadyExists(post.slug))
                }
                Ok(post) => {
                    known_slugs.insert(post.slug.clone());
                    Outcome::Done(post)
                }
                Err(reason) => {
                    warn!(item = %label, %reason, "Skipping feed item");
                    Outcome::skipped(label, reason)
                }
            }
        })
        .collect()
}

/// Fetch the feed and convert it into post outcomes.
///
/// # Arguments
///
/// * `fetcher` - Source of the feed document
/// * `config` - Feed address and excerpt length
/// * `known_slugs` - Slugs already migrated; accepted posts are added to it
///
/// # Errors
///
/// Returns an error if the feed cannot be fetched or is not valid RSS.
#[instrument(level = "info", skip(fetcher, known_slugs), fields(url = %config.url))]
pub async fn fetch_posts<F: FetchAsync>(
    fetcher: &F,
    config: &FeedConfig,
    known_slugs: &mut HashSet<String>,
) -> Result<Vec<Outcome<FeedPost>>, Box<dyn Error>> {
    let xml = fetcher.fetch_text(&config.url).await?;
    info!(bytes = xml.len(), "Fetched feed");

    let items = parse_feed(&xml).inspect_err(|e| {
        warn!(error = %e, preview = %truncate_for_log(&xml, 200), "Feed is not valid RSS");
    })?;
    info!(count = items.len(), "Found feed items");

    Ok(collect_posts(items.as_slice(), known_slugs, Utc::now(), config.excerpt_chars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Blog</title>
    <link>https://blog.test/</link>
    <item>
      <title><![CDATA[Implanty &amp; korony]]></title>
      <link>https://blog.test/implanty-i-korony/</link>
      <pubDate>Tue, 02 Jan 2024 10:00:00 +0000</pubDate>
      <description><![CDATA[<p>Krótki <b>opis</b> wpisu</p>]]></description>
      <content:encoded><![CDATA[<p>Treść</p><img class="x" src="https://blog.test/a.jpg" />]]></content:encoded>
    </item>
    <item>
      <title>Bez linku</title>
    </item>
    <item>
      <title>Nowy Wpis!</title>
      <link>https://blog.test/</link>
    </item>
  </channel>
</rss>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_feed_items() {
        let items = parse_feed(FEED).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].link.as_deref(), Some("https://blog.test/implanty-i-korony/"));
        assert!(items[0].content.as_deref().unwrap().contains("a.jpg"));
        assert!(items[1].link.is_none());
    }

    #[test]
    fn test_to_post_full_item() {
        let items = parse_feed(FEED).unwrap();
        let post = to_post(&items[0], now(), 150).unwrap();

        assert_eq!(post.slug, "implanty-i-korony");
        assert_eq!(post.date, "2024-01-02T10:00:00+00:00");
        assert_eq!(post.image.as_deref(), Some("https://blog.test/a.jpg"));
        assert_eq!(post.excerpt, "Krótki opis wpisu...");
        assert!(post.content.starts_with("<p>Treść</p>"));
        assert!(post.is_published);
    }

    #[test]
    fn test_to_post_slug_falls_back_to_title() {
        let item = FeedItem {
            title: Some("Nowy Wpis!".to_string()),
            link: Some("https://blog.test/".to_string()),
            ..FeedItem::default()
        };
        let post = to_post(&item, now(), 150).unwrap();
        assert_eq!(post.slug, "nowy-wpis");
        assert_eq!(post.date, now().to_rfc3339());
        assert_eq!(post.excerpt, "");
        assert_eq!(post.image, None);
    }

    #[test]
    fn test_to_post_requires_title_and_link() {
        let no_link = FeedItem {
            title: Some("T".to_string()),
            ..FeedItem::default()
        };
        assert!(matches!(to_post(&no_link, now(), 150), Err(SkipReason::MissingLink)));
        let no_title = FeedItem {
            link: Some("https://blog.test/x".to_string()),
            ..FeedItem::default()
        };
        assert!(matches!(to_post(&no_title, now(), 150), Err(SkipReason::MissingTitle)));
    }

    #[test]
    fn test_excerpt_is_truncated_by_chars() {
        let item = FeedItem {
            title: Some("T".to_string()),
            link: Some("https://blog.test/t".to_string()),
            description: Some("ąęść".repeat(10)),
            ..FeedItem::default()
        };
        let post = to_post(&item, now(), 5).unwrap();
        assert_eq!(post.excerpt, "ąęśćą...");
    }

    #[test]
    fn test_collect_posts_skips_known_slugs() {
        let items = parse_feed(FEED).unwrap();
        let mut known: HashSet<String> = ["implanty-i-korony".to_string()].into_iter().collect();

        let outcomes = collect_posts(&items, &mut known, now(), 150);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].skip_reason().map(|r| r.label()), Some("already_exists"));
        assert_eq!(outcomes[1].skip_reason().map(|r| r.label()), Some("missing_link"));
        assert!(outcomes[2].is_done());
        assert!(known.contains("nowy-wpis"));
    }

    #[tokio::test]
    async fn test_fetch_posts_invalid_feed_is_error() {
        let config = FeedConfig {
            url: "https://blog.test/feed/".to_string(),
            ..FeedConfig::default()
        };
        let fetcher = FakeFetcher::new().with_page(&config.url, "<html>not a feed");
        let mut known = HashSet::new();
        assert!(fetch_posts(&fetcher, &config, &mut known).await.is_err());
    }
}
