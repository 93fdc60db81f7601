//! Data models for migrated content and media.
//!
//! This module defines the records produced by each job:
//! - [`PageLink`]: A discovered candidate article address
//! - [`ArticleRecord`]: One scraped article, serialized to the migration JSON
//! - [`ContentBlock`]: A tagged text block inside an article body
//! - [`ImageDownload`]: One image pulled from a curated article page
//! - [`GalleryItem`]: One before/after pair produced by batch bisection
//! - [`FeedPost`]: One blog post migrated from an RSS feed

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully-qualified article address found during link discovery.
///
/// Equality is exact string equality; discovery relies on this for dedup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageLink(String);

impl PageLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The structural role of a text block inside an article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    /// Rendered from `<h3>`.
    Subheading1,
    /// Rendered from `<h4>`.
    Subheading2,
    BulletItem,
}

/// A single tagged block of visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Render the block with its structural marker.
    pub fn render(&self) -> String {
        match self.kind {
            BlockKind::Paragraph => self.text.clone(),
            BlockKind::Subheading1 => format!("### {}", self.text),
            BlockKind::Subheading2 => format!("#### {}", self.text),
            BlockKind::BulletItem => format!("* {}", self.text),
        }
    }
}

/// Join blocks into the final content payload, separated by blank lines.
pub fn render_blocks(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(ContentBlock::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One article scraped from the legacy site.
///
/// Field names on the wire match the JSON consumed by the new site's
/// import step: `title`, `date`, `content`, `url`, `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Headline text. Never empty.
    pub title: String,
    /// Publication date as printed on the page, or the configured placeholder.
    #[serde(rename = "date")]
    pub published_date: String,
    /// Rendered body text with heading and bullet markers.
    pub content: String,
    /// The page the record was scraped from.
    #[serde(rename = "url")]
    pub source_url: String,
    /// Last path segment of `source_url` without its document extension.
    pub slug: String,
}

/// Result of fetching (or reusing) one embedded article image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDownload {
    pub page_slug: String,
    /// Position of the `<img>` within the article body, counting filtered images.
    pub index: usize,
    pub remote_url: String,
    pub local_path: String,
    /// `local_path` with the public web root stripped, e.g. `/images/articles/x.jpg`.
    pub web_path: String,
    /// True when the file already existed and no request was made.
    pub reused: bool,
}

/// One entry of the before/after gallery manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GalleryItem {
    pub id: u32,
    pub before: String,
    pub after: String,
    pub title: String,
    pub description: String,
    pub motto: String,
}

/// A blog post migrated from an RSS feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedPost {
    pub title: String,
    pub slug: String,
    /// RFC 3339 publication time.
    pub date: String,
    pub content: String,
    pub image: Option<String>,
    pub excerpt: String,
    pub created_at: String,
    pub is_published: bool,
}
