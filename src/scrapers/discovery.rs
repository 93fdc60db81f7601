//! Article link discovery through the paginated listing.
//!
//! The listing is walked page by page (`?start=0`, `?start=5`, ...) up to a
//! safety bound. A page that contributes no new article link is taken as the
//! end of pagination; a listing page that fails to load ends discovery with
//! whatever was collected so far.
//!
//! # Article heuristic
//!
//! A hyperlink counts as an article when it lives under the listing path, is
//! not a pagination link, stays on the same site, and its final path segment
//! contains a digit (articles are published as `/aktualnosci/320-title`,
//! categories have no numeric id).

use crate::config::SiteConfig;
use crate::fetch::FetchAsync;
use crate::models::PageLink;
use crate::utils::last_path_segment;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

const PAGINATION_MARKER: &str = "start=";

/// Listing address for a zero-based page index.
pub fn listing_url(site: &SiteConfig, index: usize) -> String {
    let base = format!("{}{}", site.base_url.trim_end_matches('/'), site.listing_path);
    if index == 0 {
        base
    } else {
        format!("{}?{}{}", base, PAGINATION_MARKER, index * site.page_step)
    }
}

/// Extract new article links from one listing page.
///
/// Links already in `seen` are ignored, as are repeats within the page.
pub fn qualifying_links(
    html: &str,
    site_base: &Url,
    listing_path: &str,
    seen: &HashSet<PageLink>,
) -> Vec<PageLink> {
    let document = Html::parse_document(html);
    let section = format!("{}/", listing_path.trim_end_matches('/'));
    let mut page_links: Vec<PageLink> = Vec::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if !href.contains(&section) || href == listing_path || href.contains(PAGINATION_MARKER) {
            continue;
        }
        let Ok(mut resolved) = site_base.join(href) else {
            continue;
        };
        if resolved.origin() != site_base.origin() {
            continue;
        }
        resolved.set_fragment(None);

        let has_id = last_path_segment(&resolved)
            .is_some_and(|segment| segment.chars().any(|c| c.is_ascii_digit()));
        if !has_id {
            continue;
        }

        let link = PageLink::new(resolved.to_string());
        if !seen.contains(&link) && !page_links.contains(&link) {
            page_links.push(link);
        }
    }

    page_links
}

/// Walk the listing and collect every article link, in first-seen order.
///
/// Listing pages are requested one at a time through `fetcher`, starting at
/// `?start=0` and stepping by `site.page_step`, for at most `site.max_pages`
/// pages.
///
/// # Arguments
///
/// * `fetcher` - Source of listing pages (paced in production)
/// * `site` - Base URL, listing path and pagination bounds
///
/// # Returns
///
/// Unique [`PageLink`]s in the order they were first seen.
///
/// # Errors
///
/// Only an unparseable `base_url` is an error. Fetch failures end discovery
/// and return the partial result.
#[instrument(level = "info", skip_all, fields(base = %site.base_url, listing = %site.listing_path))]
pub async fn discover_links<F: FetchAsync>(
    fetcher: &F,
    site: &SiteConfig,
) -> Result<Vec<PageLink>, Box<dyn Error>> {
    let site_base = Url::parse(&site.base_url)?;
    let mut seen: HashSet<PageLink> = HashSet::new();
    let mut links: Vec<PageLink> = Vec::new();

    for index in 0..site.max_pages {
        let url = listing_url(site, index);
        info!(%url, page = index, "Crawling listing page");

        let html = match fetcher.fetch_text(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%url, error = %e, "Listing page failed; ending discovery");
                break;
            }
        };

        let new_links = qualifying_links(&html, &site_base, &site.listing_path, &seen);
        if new_links.is_empty() {
            info!(%url, "No new article links on this page; ending discovery");
            break;
        }

        debug!(count = new_links.len(), links = ?new_links, "New article links");
        for link in new_links {
            seen.insert(link.clone());
            links.push(link);
        }
    }

    info!(count = links.len(), "Discovered article links");
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;

    fn site() -> SiteConfig {
        SiteConfig {
            base_url: "https://clinic.test".to_string(),
            delay_ms: 0,
            ..SiteConfig::default()
        }
    }

    const PAGE_ONE: &str = r#"
        <a href="/aktualnosci">All news</a>
        <a href="/aktualnosci/320-nowy-gabinet">A</a>
        <a href="/aktualnosci/319-metamorfoza">B</a>
        <a href="https://clinic.test/aktualnosci/318-implanty.html">C</a>
        <a href="/aktualnosci/317-wybielanie#comments">D</a>
        <a href="/aktualnosci/porady">Category</a>
        <a href="/aktualnosci?start=5">Next</a>
        <a href="https://other.test/aktualnosci/1-offsite">Offsite</a>
        <a href="/kontakt">Contact</a>
    "#;

    #[test]
    fn test_listing_url_offsets() {
        let site = site();
        assert_eq!(listing_url(&site, 0), "https://clinic.test/aktualnosci");
        assert_eq!(listing_url(&site, 1), "https://clinic.test/aktualnosci?start=5");
        assert_eq!(listing_url(&site, 3), "https://clinic.test/aktualnosci?start=15");
    }

    #[test]
    fn test_five_links_four_with_digits() {
        let base = Url::parse("https://clinic.test").unwrap();
        let html = r#"
            <a href="/aktualnosci/1-a">1</a>
            <a href="/aktualnosci/2-b">2</a>
            <a href="/aktualnosci/3-c">3</a>
            <a href="/aktualnosci/4-d">4</a>
            <a href="/aktualnosci/kategoria">cat</a>
        "#;
        let links = qualifying_links(html, &base, "/aktualnosci", &HashSet::new());
        assert_eq!(links.len(), 4);
    }

    #[test]
    fn test_qualifying_links_filters() {
        let base = Url::parse("https://clinic.test").unwrap();
        let links = qualifying_links(PAGE_ONE, &base, "/aktualnosci", &HashSet::new());
        let urls: Vec<&str> = links.iter().map(PageLink::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "https://clinic.test/aktualnosci/320-nowy-gabinet",
                "https://clinic.test/aktualnosci/319-metamorfoza",
                "https://clinic.test/aktualnosci/318-implanty.html",
                "https://clinic.test/aktualnosci/317-wybielanie",
            ]
        );
    }

    #[test]
    fn test_non_ascii_category_links_are_not_articles() {
        let base = Url::parse("https://clinic.test").unwrap();
        let html = r#"
            <a href="/aktualnosci/zęby">Zęby</a>
            <a href="/aktualnosci/porady%20zdrowie">Porady</a>
            <a href="/aktualnosci/321-mądrość">Article</a>
        "#;
        let links = qualifying_links(html, &base, "/aktualnosci", &HashSet::new());
        assert_eq!(
            links,
            vec![PageLink::new("https://clinic.test/aktualnosci/321-m%C4%85dro%C5%9B%C4%87")]
        );
    }

    #[test]
    fn test_qualifying_links_skips_seen_and_repeats() {
        let base = Url::parse("https://clinic.test").unwrap();
        let mut seen = HashSet::new();
        seen.insert(PageLink::new("https://clinic.test/aktualnosci/1-a"));
        let html = r#"
            <a href="/aktualnosci/1-a">seen</a>
            <a href="/aktualnosci/2-b">new</a>
            <a href="/aktualnosci/2-b">repeat</a>
        "#;
        let links = qualifying_links(html, &base, "/aktualnosci", &seen);
        assert_eq!(links, vec![PageLink::new("https://clinic.test/aktualnosci/2-b")]);
    }

    #[tokio::test]
    async fn test_discovery_ends_on_fetch_failure_keeping_partial_results() {
        let fetcher = FakeFetcher::new().with_page("https://clinic.test/aktualnosci", PAGE_ONE);
        let links = discover_links(&fetcher, &site()).await.unwrap();
        assert_eq!(links.len(), 4);
        assert_eq!(
            fetcher.calls(),
            vec![
                "https://clinic.test/aktualnosci".to_string(),
                "https://clinic.test/aktualnosci?start=5".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_discovery_stops_on_page_without_new_links() {
        let fetcher = FakeFetcher::new()
            .with_page("https://clinic.test/aktualnosci", PAGE_ONE)
            .with_page(
                "https://clinic.test/aktualnosci?start=5",
                r#"<a href="/aktualnosci/316-nowe">E</a><a href="/aktualnosci/320-nowy-gabinet">A</a>"#,
            )
            .with_page("https://clinic.test/aktualnosci?start=10", PAGE_ONE)
            .with_page(
                "https://clinic.test/aktualnosci?start=15",
                r#"<a href="/aktualnosci/1-never-reached">Z</a>"#,
            );

        let links = discover_links(&fetcher, &site()).await.unwrap();

        assert_eq!(links.len(), 5);
        let unique: HashSet<&PageLink> = links.iter().collect();
        assert_eq!(unique.len(), links.len());
        assert!(!links.iter().any(|l| l.as_str().ends_with("never-reached")));
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_discovery_respects_page_bound() {
        let mut fetcher = FakeFetcher::new();
        for index in 0..4 {
            let url = listing_url(&site(), index);
            let html = format!(r#"<a href="/aktualnosci/{}-post">p</a>"#, index + 100);
            fetcher = fetcher.with_page(&url, &html);
        }
        let site = SiteConfig {
            max_pages: 2,
            ..site()
        };

        let links = discover_links(&fetcher, &site).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_discovery_rejects_invalid_base() {
        let fetcher = FakeFetcher::new();
        let site = SiteConfig {
            base_url: "not a url".to_string(),
            ..site()
        };
        assert!(discover_links(&fetcher, &site).await.is_err());
        assert!(fetcher.calls().is_empty());
    }
}
