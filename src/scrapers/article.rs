//! Article extraction from legacy article pages.
//!
//! A page becomes an [`ArticleRecord`] when a headline can be found. The date
//! and body are best effort: a missing date falls back to the configured
//! placeholder and a missing body yields empty content.
//!
//! # Body rendering
//!
//! Inside the body region, `p`, `h3`, `h4` and `ul` elements are visited in
//! document order. Headings get `###`/`####` markers, list items become
//! `* ` bullets, and blocks that are empty or contain a boilerplate phrase
//! ("Czytaj więcej") are dropped. Blocks are joined with blank lines.

use crate::config::ArticleConfig;
use crate::fetch::FetchAsync;
use crate::models::{ArticleRecord, BlockKind, ContentBlock, PageLink, render_blocks};
use crate::outcome::{Outcome, SkipReason};
use crate::scrapers::{
    SelectorText, first_element, first_match, parse_selector, parse_selectors,
    selector_strategies, visible_text,
};
use crate::utils::slug_from_url;
use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};

/// Compiled extraction rules for one run.
#[derive(Debug)]
pub struct ArticleExtractor {
    title: Vec<SelectorText>,
    date: Vec<SelectorText>,
    body: Vec<Selector>,
    block_selector: Selector,
    list_items: Selector,
    boilerplate: Vec<String>,
    date_placeholder: String,
    slug_extensions: Vec<String>,
}

impl ArticleExtractor {
    pub fn from_config(config: &ArticleConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            title: selector_strategies(&config.title_selectors)?,
            date: selector_strategies(&config.date_selectors)?,
            body: parse_selectors(&config.body_selectors)?,
            block_selector: parse_selector("p, h3, h4, ul")?,
            list_items: parse_selector("li")?,
            boilerplate: config.boilerplate.clone(),
            date_placeholder: config.date_placeholder.clone(),
            slug_extensions: config.slug_extensions.clone(),
        })
    }

    /// Build a record from a fetched page.
    pub fn parse(&self, html: &str, link: &PageLink) -> Result<ArticleRecord, SkipReason> {
        let page = Html::parse_document(html);

        let title = first_match(&self.title, &page).ok_or(SkipReason::MissingTitle)?;
        let published_date =
            first_match(&self.date, &page).unwrap_or_else(|| self.date_placeholder.clone());
        let content = match first_element(&page, &self.body) {
            Some(body) => render_blocks(&self.blocks(body)),
            None => {
                debug!(url = %link, "No body region; keeping record with empty content");
                String::new()
            }
        };

        Ok(ArticleRecord {
            title,
            published_date,
            content,
            source_url: link.to_string(),
            slug: slug_from_url(link.as_str(), &self.slug_extensions),
        })
    }

    /// Tagged text blocks of a body region, in document order.
    pub fn blocks(&self, body: ElementRef<'_>) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();

        for element in body.select(&self.block_selector) {
            let text = visible_text(element);
            if !self.keeps(&text) {
                continue;
            }
            match element.value().name() {
                "h3" => blocks.push(ContentBlock::new(BlockKind::Subheading1, text)),
                "h4" => blocks.push(ContentBlock::new(BlockKind::Subheading2, text)),
                "ul" => {
                    for item in element.select(&self.list_items) {
                        let item_text = visible_text(item);
                        if self.keeps(&item_text) {
                            blocks.push(ContentBlock::new(BlockKind::BulletItem, item_text));
                        }
                    }
                }
                _ => blocks.push(ContentBlock::new(BlockKind::Paragraph, text)),
            }
        }

        blocks
    }

    fn keeps(&self, text: &str) -> bool {
        !text.trim().is_empty() && !self.boilerplate.iter().any(|phrase| text.contains(phrase))
    }
}

/// Fetch and parse a single article page.
#[instrument(level = "info", skip_all, fields(url = %link))]
pub async fn fetch_article<F: FetchAsync>(
    fetcher: &F,
    extractor: &ArticleExtractor,
    link: &PageLink,
) -> Outcome<ArticleRecord> {
    let html = match fetcher.fetch_text(link.as_str()).await {
        Ok(html) => html,
        Err(e) => return Outcome::skipped(link.as_str(), SkipReason::Fetch(e.to_string())),
    };

    match extractor.parse(&html, link) {
        Ok(record) => {
            info!(slug = %record.slug, blocks_bytes = record.content.len(), "Parsed article");
            Outcome::Done(record)
        }
        Err(reason) => Outcome::skipped(link.as_str(), reason),
    }
}

/// Fetch all articles one after another.
///
/// # Arguments
///
/// * `fetcher` - Source of article pages
/// * `extractor` - Compiled title, date and body rules
/// * `links` - Pages to scrape, in the order they should be processed
///
/// # Returns
///
/// One [`Outcome`] per link, in input order. Failed pages are logged and
/// returned as skips; the batch always completes.
#[instrument(level = "info", skip_all, fields(count = links.len()))]
pub async fn fetch_articles<F: FetchAsync>(
    fetcher: &F,
    extractor: &ArticleExtractor,
    links: &[PageLink],
) -> Vec<Outcome<ArticleRecord>> {
    let total = links.len();
    let outcomes: Vec<Outcome<ArticleRecord>> = stream::iter(links.iter().enumerate())
        .then(|(i, link)| async move {
            info!(progress = %format!("{}/{}", i + 1, total), url = %link, "Scraping article");
            let outcome = fetch_article(fetcher, extractor, link).await;
            if let Outcome::Skipped { item, reason } = &outcome {
                warn!(url = %item, reason = %reason, "Skipping article");
            }
            outcome
        })
        .collect()
        .await;

    let parsed = outcomes.iter().filter(|o| o.is_done()).count();
    info!(parsed, skipped = total - parsed, "Fetched article contents");
    outcomes
}
