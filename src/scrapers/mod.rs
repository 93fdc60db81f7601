//! Scrapers for the legacy content site and its blog feed.
//!
//! Each scraper follows the same per-item pattern: fetch, parse, produce an
//! [`Outcome`](crate::outcome::Outcome) per unit, never abort on one bad unit.
//!
//! | Job | Module | Input |
//! |-----|--------|-------|
//! | Link discovery | [`discovery`] | Paginated article listing |
//! | Article extraction | [`article`] | Discovered [`PageLink`](crate::models::PageLink)s |
//! | Image extraction | [`images`] | Curated page list |
//! | Feed migration | [`feed`] | RSS 2.0 feed |
//!
//! # Extraction strategies
//!
//! Title, date and body detection all use "first match wins" over an ordered
//! list of CSS selectors. Each selector is an [`ExtractStrategy`]; the lists
//! come from [`ArticleConfig`](crate::config::ArticleConfig).

pub mod article;
pub mod discovery;
pub mod feed;
pub mod images;

use scraper::{ElementRef, Html, Selector};
use std::error::Error;

/// One way of pulling a piece of text out of a parsed page.
pub trait ExtractStrategy {
    fn try_extract(&self, page: &Html) -> Option<String>;
}

/// Text of the first element matching a CSS selector, whitespace-collapsed.
/// An element with no visible text does not count as a match.
#[derive(Debug, Clone)]
pub struct SelectorText {
    selector: Selector,
}

impl SelectorText {
    pub fn parse(css: &str) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            selector: parse_selector(css)?,
        })
    }
}

impl ExtractStrategy for SelectorText {
    fn try_extract(&self, page: &Html) -> Option<String> {
        let element = page.select(&self.selector).next()?;
        let text = visible_text(element);
        (!text.is_empty()).then_some(text)
    }
}

/// Build a strategy list from CSS selectors, keeping their order.
pub fn selector_strategies(selectors: &[String]) -> Result<Vec<SelectorText>, Box<dyn Error>> {
    selectors.iter().map(|css| SelectorText::parse(css)).collect()
}

/// Try strategies in order and return the first hit.
pub fn first_match<S: ExtractStrategy>(strategies: &[S], page: &Html) -> Option<String> {
    strategies.iter().find_map(|s| s.try_extract(page))
}

/// Parse a list of selectors, in order.
pub fn parse_selectors(selectors: &[String]) -> Result<Vec<Selector>, Box<dyn Error>> {
    selectors.iter().map(|css| parse_selector(css)).collect()
}

pub fn parse_selector(css: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(css).map_err(|e| format!("invalid selector {css:?}: {e}").into())
}

/// First element matched by the earliest selector in `selectors` that matches anything.
pub fn first_element<'a>(page: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| page.select(s).next())
}

/// Visible text of an element: script and style content is skipped and runs
/// of whitespace collapse to a single space.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_visible_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !matches!(child_element.value().name(), "script" | "style") {
                push_visible_text(child_element, out);
            }
        }
    }
}
