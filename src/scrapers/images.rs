//! Image extraction from a curated list of article pages.
//!
//! For every target page the article body is located, its `<img>` elements
//! are enumerated, navigation icons are filtered out, and each remaining
//! image is saved as `{save_dir}/{slug}_{index}_{filename}`.
//!
//! Re-runs are cheap: a file that already exists locally is reused without a
//! request. There is no content check, so an image that changed upstream
//! under the same name is never refreshed.

use crate::config::{ArticleConfig, ImagesConfig, SiteConfig};
use crate::fetch::FetchAsync;
use crate::models::ImageDownload;
use crate::outcome::{Outcome, SkipReason};
use crate::scrapers::{first_element, parse_selector, parse_selectors};
use crate::utils::{sanitize_filename, slug_from_url, web_path};
use scraper::{Html, Selector};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// An image reference found in an article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    /// Position among all `<img>` elements of the body.
    pub index: usize,
    pub url: String,
}

/// Compiled image extraction rules.
#[derive(Debug)]
pub struct ImageExtractor {
    site_base: Url,
    body: Vec<Selector>,
    img: Selector,
    skip_patterns: Vec<String>,
    slug_extensions: Vec<String>,
    save_dir: PathBuf,
    public_dir: PathBuf,
}

impl ImageExtractor {
    pub fn new(
        site: &SiteConfig,
        images: &ImagesConfig,
        article: &ArticleConfig,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            site_base: Url::parse(&site.base_url)?,
            body: parse_selectors(&images.body_selectors)?,
            img: parse_selector("img")?,
            skip_patterns: images.skip_patterns.clone(),
            slug_extensions: article.slug_extensions.clone(),
            save_dir: PathBuf::from(&images.save_dir),
            public_dir: PathBuf::from(&images.public_dir),
        })
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Content images of a page, with absolute addresses.
    ///
    /// Returns `None` when the page has no article body.
    pub fn image_sources(&self, html: &str) -> Option<Vec<ImageSource>> {
        let page = Html::parse_document(html);
        let body = first_element(&page, &self.body)?;

        let sources = body
            .select(&self.img)
            .enumerate()
            .filter_map(|(index, img)| {
                let src = img.value().attr("src")?.trim();
                if src.is_empty() || self.skip_patterns.iter().any(|p| src.contains(p)) {
                    return None;
                }
                let url = self.site_base.join(src).ok()?;
                Some(ImageSource {
                    index,
                    url: url.to_string(),
                })
            })
            .collect();
        Some(sources)
    }

    /// Local file an image is stored at.
    pub fn local_path(&self, page_slug: &str, source: &ImageSource) -> PathBuf {
        let remote_name = source
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let filename = sanitize_filename(remote_name);
        self.save_dir
            .join(format!("{}_{}_{}", page_slug, source.index, filename))
    }

    /// Download one image unless it is already on disk.
    #[instrument(level = "debug", skip(self, fetcher), fields(url = %source.url))]
    pub async fn download<F: FetchAsync>(
        &self,
        fetcher: &F,
        page_slug: &str,
        source: &ImageSource,
    ) -> Outcome<ImageDownload> {
        let local = self.local_path(page_slug, source);
        let record = |reused: bool| ImageDownload {
            page_slug: page_slug.to_string(),
            index: source.index,
            remote_url: source.url.clone(),
            local_path: local.to_string_lossy().into_owned(),
            web_path: web_path(&local, &self.public_dir),
            reused,
        };

        if fs::try_exists(&local).await.unwrap_or(false) {
            debug!(path = %local.display(), "Already downloaded; reusing");
            return Outcome::Done(record(true));
        }

        let fetched = match fetcher.fetch_bytes(&source.url).await {
            Ok(fetched) => fetched,
            Err(e) => return Outcome::skipped(&source.url, SkipReason::Fetch(e.to_string())),
        };
        if fetched.status != 200 {
            return Outcome::skipped(&source.url, SkipReason::HttpStatus(fetched.status));
        }
        if let Err(e) = fs::write(&local, &fetched.body).await {
            return Outcome::skipped(&source.url, SkipReason::Io(e));
        }

        info!(path = %local.display(), bytes = fetched.body.len(), "Downloaded image");
        Outcome::Done(record(false))
    }
}

/// Pull every content image from one page.
///
/// A page that fails to load or has no article body yields a single skip.
#[instrument(level = "info", skip(fetcher, extractor))]
pub async fn extract_page_images<F: FetchAsync>(
    fetcher: &F,
    extractor: &ImageExtractor,
    page_url: &str,
) -> Vec<Outcome<ImageDownload>> {
    let slug = slug_from_url(page_url, &extractor.slug_extensions);

    let html = match fetcher.fetch_text(page_url).await {
        Ok(html) => html,
        Err(e) => return vec![Outcome::skipped(page_url, SkipReason::Fetch(e.to_string()))],
    };

    let Some(sources) = extractor.image_sources(&html) else {
        warn!(url = %page_url, "No content region found");
        return vec![Outcome::skipped(page_url, SkipReason::NoContentRegion)];
    };
    info!(%slug, images = sources.len(), "Scanning article images");

    let mut outcomes = Vec::with_capacity(sources.len());
    for source in &sources {
        let outcome = extractor.download(fetcher, &slug, source).await;
        if let Some(reason) = outcome.skip_reason() {
            warn!(url = %source.url, %reason, "Failed to download image");
        }
        outcomes.push(outcome);
    }
    outcomes
}

/// Run image extraction over all target pages, one after another.
///
/// # Arguments
///
/// * `fetcher` - Source of pages and image bytes
/// * `extractor` - Body selectors, filters and the save directory
/// * `targets` - Article page addresses to scan
///
/// # Returns
///
/// Outcomes for every image of every page, in page order. A page that
/// cannot be loaded contributes one skip.
///
/// # Errors
///
/// Returns an error only if the save directory cannot be created.
#[instrument(level = "info", skip_all, fields(targets = targets.len()))]
pub async fn extract_images<F: FetchAsync>(
    fetcher: &F,
    extractor: &ImageExtractor,
    targets: &[String],
) -> Result<Vec<Outcome<ImageDownload>>, Box<dyn Error>> {
    fs::create_dir_all(extractor.save_dir()).await?;

    let mut outcomes = Vec::new();
    for target in targets {
        outcomes.extend(extract_page_images(fetcher, extractor, target).await);
    }
    Ok(outcomes)
}
