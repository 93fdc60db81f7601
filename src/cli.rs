//! Command-line interface definitions for the migration jobs.
//!
//! Each job is a subcommand. Run parameters come from the built-in defaults,
//! then an optional YAML config file (`--config`), then the flags given here.

use crate::config::MigrationConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for `site_migrate`.
///
/// # Examples
///
/// ```sh
/// # Scrape the legacy news section into JSON
/// site_migrate scrape -o migrated_articles.json
///
/// # Split a before/after photo
/// site_migrate split --input public/raw.jpg --before public/before.jpg --after public/after.jpg
///
/// # Use a config file for every job
/// site_migrate --config migrate.yaml images
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true, env = "SITE_MIGRATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover article pages on the legacy site and export them as JSON
    Scrape {
        /// Output JSON file
        #[arg(short, long)]
        output: Option<String>,

        /// Base URL of the legacy site
        #[arg(long)]
        base_url: Option<String>,

        /// Maximum number of listing pages to crawl
        #[arg(long)]
        max_pages: Option<usize>,

        /// Pause between requests, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Download the images embedded in a curated list of article pages
    Images {
        /// Article pages to scan (defaults to the configured targets)
        targets: Vec<String>,

        /// Directory the images are saved to
        #[arg(long)]
        save_dir: Option<String>,
    },

    /// Split one side-by-side comparison photo into before/after halves
    Split {
        #[arg(short, long, default_value = "public/metamorphosis_raw.jpg")]
        input: PathBuf,

        #[arg(short, long, default_value = "public/metamorphosis_before.jpg")]
        before: PathBuf,

        #[arg(short, long, default_value = "public/metamorphosis_after.jpg")]
        after: PathBuf,

        /// JPEG quality (1-100)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
    },

    /// Split a batch of comparison photos and write a gallery manifest
    SplitBatch {
        /// Directory holding the source photos
        #[arg(short, long)]
        source_dir: PathBuf,

        /// Directory the halves and gallery.json are written to
        #[arg(short, long, default_value = "public/images/metamorphoses")]
        target_dir: PathBuf,

        /// First gallery id
        #[arg(long)]
        start_id: Option<u32>,

        /// Photo names without extension; every JPEG/PNG in the source dir when omitted
        names: Vec<String>,
    },

    /// Make checkerboard-patterned backgrounds transparent, in place
    FixTransparency {
        /// PNG files to rewrite
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract plain text from PDF documents
    PdfText {
        /// PDF files to read
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory the .txt files are written to
        #[arg(short, long, default_value = "data")]
        out_dir: PathBuf,
    },

    /// Migrate blog posts from an RSS feed into JSON
    Feed {
        /// Feed URL
        #[arg(long)]
        url: Option<String>,

        /// Output JSON file; existing posts in it are kept
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Command {
    /// Apply the flags of this subcommand on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut MigrationConfig) {
        match self {
            Command::Scrape {
                output,
                base_url,
                max_pages,
                delay_ms,
            } => {
                if let Some(output) = output {
                    config.article.output = output.clone();
                }
                if let Some(base_url) = base_url {
                    config.site.base_url = base_url.clone();
                }
                if let Some(max_pages) = max_pages {
                    config.site.max_pages = *max_pages;
                }
                if let Some(delay_ms) = delay_ms {
                    config.site.delay_ms = *delay_ms;
                }
            }
            Command::Images { targets, save_dir } => {
                if !targets.is_empty() {
                    config.images.targets = targets.clone();
                }
                if let Some(save_dir) = save_dir {
                    config.images.save_dir = save_dir.clone();
                }
            }
            Command::Split { quality, .. } => {
                if let Some(quality) = quality {
                    config.bisect.quality = *quality;
                }
            }
            Command::SplitBatch { start_id, .. } => {
                if let Some(start_id) = start_id {
                    config.bisect.start_id = *start_id;
                }
            }
            Command::Feed { url, output } => {
                if let Some(url) = url {
                    config.feed.url = url.clone();
                }
                if let Some(output) = output {
                    config.feed.output = output.clone();
                }
            }
            Command::FixTransparency { .. } | Command::PdfText { .. } => {}
        }
    }
}
