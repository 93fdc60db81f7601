//! Utility functions for URL slugs, filenames, string manipulation and file system checks.
//!
//! This module provides helpers shared by the jobs:
//! - Slug derivation from article URLs and titles
//! - Filename sanitizing for downloaded assets
//! - Local-path to web-path mapping
//! - String truncation for logging
//! - File system validation for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static NON_SLUG_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Last non-empty path segment of a URL, percent-decoded.
///
/// `Url` keeps its path percent-encoded, so `/aktualnosci/zęby` has the raw
/// segment `z%C4%99by`. Decoding restores the text the site author wrote.
///
/// # Arguments
///
/// * `url` - Parsed address to inspect
///
/// # Returns
///
/// The decoded segment, or `None` for a root or empty path. A segment that
/// does not decode to valid UTF-8 is returned as-is.
pub fn last_path_segment(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|segment| !segment.is_empty())?;
    Some(percent_decode(segment))
}

fn percent_decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Derive an article slug from its address.
///
/// Takes the last non-empty path segment (percent-decoded, so Polish
/// characters survive) and strips the first matching document extension.
/// Query strings and fragments are ignored.
///
/// # Arguments
///
/// * `url` - Article address; relative paths are accepted
/// * `extensions` - Suffixes such as `.html` to strip, tried in order
///
/// # Returns
///
/// The slug, or an empty string when the address has no path segment.
///
/// # Examples
///
/// ```ignore
/// let exts = vec![".html".to_string()];
/// assert_eq!(slug_from_url("https://a.pl/aktualnosci/311-metamorfoza.html", &exts), "311-metamorfoza");
/// ```
pub fn slug_from_url(url: &str, extensions: &[String]) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => last_path_segment(&parsed).unwrap_or_default(),
        Err(_) => percent_decode(url.trim_end_matches('/').rsplit('/').next().unwrap_or_default()),
    };

    extensions
        .iter()
        .find_map(|ext| segment.strip_suffix(ext.as_str()))
        .map(str::to_string)
        .unwrap_or(segment)
}

/// Convert a title to a URL-friendly slug.
///
/// Lowercases the text, replaces every run of characters outside
/// `[a-z0-9]` with a hyphen and trims hyphens at both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// assert_eq!(slugify_title("  Test -- Article! "), "test-article");
/// ```
pub fn slugify_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Keep only alphanumerics and `.`, `-`, `_` in a remote filename.
///
/// Percent-encoded names are decoded first so `zdj%C4%99cie.jpg` keeps its letters.
pub fn sanitize_filename(raw: &str) -> String {
    percent_decode(raw)
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}

/// Map a file under the public directory to the path the site serves it at.
///
/// Paths outside `public_dir` are returned unchanged.
pub fn web_path(local: &Path, public_dir: &Path) -> String {
    match local.strip_prefix(public_dir) {
        Ok(rest) => {
            let joined = rest
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            format!("/{joined}")
        }
        Err(_) => local.to_string_lossy().into_owned(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary at or before `max` bytes, with
/// an ellipsis and a count of the dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

/// Ensure the parent directory of an output file is writable.
pub async fn ensure_parent_writable(file: &Path) -> Result<(), Box<dyn Error>> {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_writable_dir(parent).await,
        _ => ensure_writable_dir(Path::new(".")).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec![".html".to_string(), ".htm".to_string(), ".php".to_string()]
    }

    #[test]
    fn test_slug_from_url_strips_extension() {
        assert_eq!(
            slug_from_url("https://a.pl/aktualnosci/311-metamorfoza.html", &exts()),
            "311-metamorfoza"
        );
        assert_eq!(slug_from_url("https://a.pl/aktualnosci/12-x.php?id=3", &exts()), "12-x");
    }

    #[test]
    fn test_slug_from_url_trailing_slash_and_plain() {
        assert_eq!(slug_from_url("https://a.pl/blog/tytul-artykulu/", &exts()), "tytul-artykulu");
        assert_eq!(slug_from_url("https://a.pl/aktualnosci/7-plain", &exts()), "7-plain");
        assert_eq!(slug_from_url("relative/path/9-item.htm", &exts()), "9-item");
    }

    #[test]
    fn test_last_path_segment() {
        let url = Url::parse("https://a.pl/x/y/").unwrap();
        assert_eq!(last_path_segment(&url).as_deref(), Some("y"));
        let root = Url::parse("https://a.pl/").unwrap();
        assert_eq!(last_path_segment(&root), None);
    }

    #[test]
    fn test_last_path_segment_is_decoded() {
        let url = Url::parse("https://a.pl/aktualnosci/zęby").unwrap();
        assert_eq!(last_path_segment(&url).as_deref(), Some("zęby"));
        let spaced = Url::parse("https://a.pl/aktualnosci/porady%20zdrowie").unwrap();
        assert_eq!(last_path_segment(&spaced).as_deref(), Some("porady zdrowie"));
    }

    #[test]
    fn test_slug_from_url_keeps_polish_characters() {
        assert_eq!(
            slug_from_url("https://mikrostomart.pl/aktualnosci/320-zęby-mądrości.html", &exts()),
            "320-zęby-mądrości"
        );
        assert_eq!(
            slug_from_url("https://a.pl/aktualnosci/12-z%C4%99by.php", &exts()),
            "12-zęby"
        );
    }

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify_title("Hello World"), "hello-world");
        assert_eq!(slugify_title("  Test -- Article! "), "test-article");
        assert_eq!(slugify_title("Special@#$Characters"), "special-characters");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("foto (1).jpg"), "foto1.jpg");
        assert_eq!(sanitize_filename("a_b-c.PNG"), "a_b-c.PNG");
        assert_eq!(sanitize_filename("zdj%C4%99cie.jpg"), "zdjęcie.jpg");
        assert_eq!(sanitize_filename("bad%ZZname.gif"), "badZZname.gif");
    }

    #[test]
    fn test_web_path() {
        let local = Path::new("public/images/articles/real_cases/a_0_x.jpg");
        assert_eq!(web_path(local, Path::new("public")), "/images/articles/real_cases/a_0_x.jpg");
        assert_eq!(web_path(Path::new("other/x.jpg"), Path::new("public")), "other/x.jpg");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_char_boundary() {
        let result = truncate_for_log("ąąą", 3);
        assert_eq!(result, "ą…(+4 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
