//! JSON output for migrated records.
//!
//! Every job that produces records writes them as one pretty-printed UTF-8
//! JSON array, ready for the new site's import step:
//!
//! ```text
//! migrated_articles.json      # ArticleRecord[]
//! migrated_blog_posts.json    # FeedPost[]
//! <target>/gallery.json       # GalleryItem[]
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write records as a pretty-printed JSON array, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records<T: Serialize>(
    records: &[T],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote JSON file");
    Ok(())
}

/// Read a JSON array written by a previous run; a missing file is an empty list.
pub async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Box<dyn Error>> {
    if !fs::try_exists(path).await? {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
