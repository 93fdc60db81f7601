//! # Site Migrate
//!
//! One-off content migration tooling for moving a dental clinic's legacy
//! website onto a new site. Each job reads from the old site (or from local
//! files), produces JSON records or processed images, and prints a short
//! report to stdout.
//!
//! ## Jobs
//!
//! - `scrape`: discovers news articles by walking the paginated listing and
//!   exports title, date and Markdown-like body text
//! - `images`: downloads the images of a curated list of article pages and
//!   prints Markdown image references per article
//! - `split` / `split-batch`: cut side-by-side comparison photos into
//!   before/after halves, optionally with a gallery manifest
//! - `fix-transparency`: key out baked-in checkerboard backgrounds in PNGs
//! - `pdf-text`: dump the text of PDF documents
//! - `feed`: migrate blog posts from an RSS feed
//!
//! ## Usage
//!
//! ```sh
//! site_migrate scrape -o migrated_articles.json
//! RUST_LOG=debug site_migrate images
//! ```
//!
//! Network jobs are strictly sequential with a fixed pause between requests.
//! Per-item failures are logged and skipped; a job only aborts when its
//! output cannot be written.

use clap::Parser;
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod fetch;
mod media;
mod models;
mod outcome;
mod outputs;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use config::MigrationConfig;
use fetch::{FetchAsync, site_fetcher};
use media::{bisect, checkerboard, pdf};
use models::FeedPost;
use outcome::partition;
use outputs::{json, report};
use scrapers::article::{ArticleExtractor, fetch_articles};
use scrapers::discovery::discover_links;
use scrapers::feed::fetch_posts;
use scrapers::images::{ImageExtractor, extract_images};
use utils::{ensure_parent_writable, ensure_writable_dir};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("site_migrate starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = MigrationConfig::load(args.config.as_deref())?;
    args.command.apply_overrides(&mut config);

    match args.command {
        Command::Scrape { .. } => run_scrape(&config, &site_fetcher(&config.site)?).await?,
        Command::Images { .. } => run_images(&config, &site_fetcher(&config.site)?).await?,
        Command::Split {
            input,
            before,
            after,
            ..
        } => run_split(&config, &input, &before, &after)?,
        Command::SplitBatch {
            source_dir,
            target_dir,
            names,
            ..
        } => run_split_batch(&config, &source_dir, &target_dir, &names).await?,
        Command::FixTransparency { files } => run_fix_transparency(&config, &files),
        Command::PdfText { inputs, out_dir } => run_pdf_text(&inputs, &out_dir),
        Command::Feed { .. } => run_feed(&config, &site_fetcher(&config.site)?).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        elapsed_secs = elapsed.as_secs_f64(),
        "Execution time: {:.2?}", elapsed
    );
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_scrape(
    config: &MigrationConfig,
    fetcher: &impl FetchAsync,
) -> Result<(), Box<dyn Error>> {
    let output = PathBuf::from(&config.article.output);
    ensure_parent_writable(&output).await?;

    let extractor = ArticleExtractor::from_config(&config.article)?;

    let links = discover_links(fetcher, &config.site).await?;
    info!(count = links.len(), "Found unique article links");

    let outcomes = fetch_articles(fetcher, &extractor, &links).await;
    let (records, skipped) = partition(outcomes);

    json::write_records(&records, &output).await?;
    print!("{}", report::summary("scrape", records.len(), &skipped));
    println!("Saved {} articles to {}", records.len(), output.display());
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_images(
    config: &MigrationConfig,
    fetcher: &impl FetchAsync,
) -> Result<(), Box<dyn Error>> {
    let extractor = ImageExtractor::new(&config.site, &config.images, &config.article)?;
    ensure_writable_dir(extractor.save_dir()).await?;

    let outcomes = extract_images(fetcher, &extractor, &config.images.targets).await?;
    let (downloads, skipped) = partition(outcomes);
    let reused = downloads.iter().filter(|d| d.reused).count();
    info!(downloaded = downloads.len() - reused, reused, "Image extraction finished");

    print!("{}", report::image_snippets(&downloads, &config.images.alt_text));
    print!("{}", report::summary("images", downloads.len(), &skipped));
    Ok(())
}

fn run_split(
    config: &MigrationConfig,
    input: &Path,
    before: &Path,
    after: &Path,
) -> Result<(), Box<dyn Error>> {
    for output in [before, after] {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }

    let split = bisect::split_file(input, before, after, config.bisect.quality)?;
    println!(
        "Split {}x{} into {} ({}px) and {}",
        split.width,
        split.height,
        split.before.display(),
        split.left_width,
        split.after.display()
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(source = %source_dir.display()))]
async fn run_split_batch(
    config: &MigrationConfig,
    source_dir: &Path,
    target_dir: &Path,
    names: &[String],
) -> Result<(), Box<dyn Error>> {
    ensure_writable_dir(target_dir).await?;

    let inputs = bisect::batch_inputs(source_dir, names, &config.bisect.source_extensions)?;
    let outcomes = bisect::split_batch(inputs, target_dir, &config.bisect);
    let (items, skipped) = partition(outcomes);

    json::write_records(&items, &target_dir.join("gallery.json")).await?;
    println!("{}", report::gallery_snippet(&items)?);
    print!("{}", report::summary("split-batch", items.len(), &skipped));
    Ok(())
}

fn run_fix_transparency(config: &MigrationConfig, files: &[PathBuf]) {
    let outcomes = checkerboard::remove_checkerboards(files, &config.checkerboard);
    let (keyed, skipped) = partition(outcomes);
    for image in &keyed {
        println!(
            "{}: cleared {} of {} pixels",
            image.path.display(),
            image.cleared,
            image.total
        );
    }
    print!("{}", report::summary("fix-transparency", keyed.len(), &skipped));
}

fn run_pdf_text(inputs: &[PathBuf], out_dir: &Path) {
    let outcomes = pdf::extract_all(inputs, out_dir);
    let (written, skipped) = partition(outcomes);
    for path in &written {
        println!("Saved text to {}", path.display());
    }
    print!("{}", report::summary("pdf-text", written.len(), &skipped));
}

#[instrument(level = "info", skip_all)]
async fn run_feed(
    config: &MigrationConfig,
    fetcher: &impl FetchAsync,
) -> Result<(), Box<dyn Error>> {
    let output = PathBuf::from(&config.feed.output);
    ensure_parent_writable(&output).await?;

    let mut posts: Vec<FeedPost> = json::read_records(&output).await?;
    let mut known_slugs: HashSet<String> = posts.iter().map(|p| p.slug.clone()).collect();
    if !posts.is_empty() {
        info!(count = posts.len(), "Loaded previously migrated posts");
    }

    let outcomes = match fetch_posts(fetcher, &config.feed, &mut known_slugs).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            warn!(error = %e, "Could not read feed; nothing migrated");
            Vec::new()
        }
    };
    let (new_posts, skipped) = partition(outcomes);
    let added = new_posts.len();
    posts.extend(new_posts);

    json::write_records(&posts, &output).await?;
    print!("{}", report::summary("feed", added, &skipped));
    println!("{} posts in {}", posts.len(), output.display());
    Ok(())
}
