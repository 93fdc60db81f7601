//! Run parameters for every migration job.
//!
//! All values have built-in defaults matching the legacy site. An optional
//! YAML file overrides any subset of them; CLI flags then override single
//! values for one run (see [`crate::cli`]).
//!
//! ```yaml
//! site:
//!   base_url: https://mikrostomart.pl
//!   delay_ms: 1500
//! article:
//!   output: out/articles.json
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub site: SiteConfig,
    pub article: ArticleConfig,
    pub images: ImagesConfig,
    pub bisect: BisectConfig,
    pub checkerboard: CheckerboardConfig,
    pub feed: FeedConfig,
}

/// The legacy site and how politely to crawl it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    /// Path of the paginated article listing, without trailing slash.
    pub listing_path: String,
    /// Number of articles per listing page (the `start=` offset step).
    pub page_step: usize,
    /// Safety bound on listing pages visited.
    pub max_pages: usize,
    /// Pause before every request except the first.
    pub delay_ms: u64,
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mikrostomart.pl".to_string(),
            listing_path: "/aktualnosci".to_string(),
            page_step: 5,
            max_pages: 10,
            delay_ms: 1000,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

/// Article extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleConfig {
    /// Headline selectors, tried in order.
    pub title_selectors: Vec<String>,
    pub date_selectors: Vec<String>,
    pub body_selectors: Vec<String>,
    /// Blocks containing any of these phrases are dropped.
    pub boilerplate: Vec<String>,
    pub date_placeholder: String,
    /// Suffixes stripped from the last URL segment when deriving a slug.
    pub slug_extensions: Vec<String>,
    pub output: String,
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            title_selectors: strings(&["h1", "h2.item-title", ".page-header h2"]),
            date_selectors: strings(&[".created-date", ".published", "time", ".date"]),
            body_selectors: strings(&[
                ".item-page",
                ".article-content",
                ".entry-content",
                "[itemprop=\"articleBody\"]",
            ]),
            boilerplate: strings(&["Czytaj więcej"]),
            date_placeholder: "2024-01-01".to_string(),
            slug_extensions: strings(&[".html", ".htm", ".php"]),
            output: "migrated_articles.json".to_string(),
        }
    }
}

/// Image extraction from a curated list of pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub targets: Vec<String>,
    pub body_selectors: Vec<String>,
    /// Image addresses containing any of these substrings are not content.
    pub skip_patterns: Vec<String>,
    pub save_dir: String,
    /// Filesystem root served as `/` by the new site.
    pub public_dir: String,
    pub alt_text: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            targets: strings(&[
                "https://mikrostomart.pl/aktualnosci/313-metamorfoza-2",
                "https://mikrostomart.pl/aktualnosci/314-metamorfoza-3",
                "https://mikrostomart.pl/aktualnosci/311-metamorfoza",
                "https://mikrostomart.pl/aktualnosci/303-zawsze-sie-znajdzie-ktos-kto-zrobi-taniej",
                "https://mikrostomart.pl/aktualnosci/279-kolejna-metamorfoza-usmiechu-w-naszym-wykonaniu-2",
            ]),
            body_selectors: strings(&[
                ".item-page",
                ".article-content",
                "[itemprop=\"articleBody\"]",
            ]),
            skip_patterns: strings(&["printButton", "emailButton"]),
            save_dir: "public/images/articles/real_cases".to_string(),
            public_dir: "public".to_string(),
            alt_text: "Zdjęcie z zabiegu".to_string(),
        }
    }
}

/// Before/after bisection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectConfig {
    pub quality: u8,
    /// Extensions tried, in order, when resolving a named batch input.
    pub source_extensions: Vec<String>,
    pub start_id: u32,
    /// Web path prefix for the gallery manifest.
    pub web_prefix: String,
    pub description: String,
    pub motto: String,
}

impl Default for BisectConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            source_extensions: strings(&["jpg", "png"]),
            start_id: 4,
            web_prefix: "/images/metamorphoses".to_string(),
            description: "Kompleksowa poprawa estetyki uśmiechu.".to_string(),
            motto: "\"Nowy uśmiech, nowe życie.\"".to_string(),
        }
    }
}

/// Color-key thresholds for checkerboard removal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerboardConfig {
    /// Channels strictly above this count as white.
    pub white_threshold: u8,
    /// Inclusive lower bound of the gray band.
    pub gray_min: u8,
    /// Exclusive upper bound of the gray band.
    pub gray_max: u8,
    /// Max spread between channels for a pixel to count as gray.
    pub gray_tolerance: u8,
}

impl Default for CheckerboardConfig {
    fn default() -> Self {
        Self {
            white_threshold: 240,
            gray_min: 150,
            gray_max: 220,
            gray_tolerance: 10,
        }
    }
}

/// RSS blog migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub output: String,
    pub excerpt_chars: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://nowosielski.pl/feed/".to_string(),
            output: "migrated_blog_posts.json".to_string(),
            excerpt_chars: 150,
        }
    }
}

impl MigrationConfig {
    /// Load configuration from an optional YAML file, falling back to defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            None => {
                info!("No config file given; using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_legacy_site() {
        let config = MigrationConfig::default();
        assert_eq!(config.site.page_step, 5);
        assert_eq!(config.site.max_pages, 10);
        assert_eq!(config.article.date_placeholder, "2024-01-01");
        assert_eq!(config.article.title_selectors[0], "h1");
        assert_eq!(config.bisect.quality, 85);
        assert_eq!(config.checkerboard.white_threshold, 240);
    }

    #[test]
    fn test_partial_yaml_overrides_only_given_fields() {
        let yaml = r#"
site:
  base_url: https://example.com
  delay_ms: 0
article:
  output: out/articles.json
checkerboard:
  gray_tolerance: 4
"#;
        let config = MigrationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.site.base_url, "https://example.com");
        assert_eq!(config.site.delay_ms, 0);
        assert_eq!(config.site.listing_path, "/aktualnosci");
        assert_eq!(config.article.output, "out/articles.json");
        assert_eq!(config.article.boilerplate, vec!["Czytaj więcej".to_string()]);
        assert_eq!(config.checkerboard.gray_tolerance, 4);
        assert_eq!(config.checkerboard.gray_min, 150);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = MigrationConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.feed.excerpt_chars, 150);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(MigrationConfig::from_yaml("site: [1, 2").is_err());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = MigrationConfig::load(None).unwrap();
        assert_eq!(config.images.skip_patterns.len(), 2);
    }
}
