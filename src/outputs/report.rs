//! Human-readable console reports.
//!
//! Reports go to stdout so they can be copied into the new site's sources;
//! logs go to stderr.

use crate::models::{GalleryItem, ImageDownload};
use crate::outcome::SkipReason;
use itertools::Itertools;
use std::fmt::Write;

/// Totals for one job plus every skip, grouped by reason.
pub fn summary(job: &str, done: usize, skipped: &[(String, SkipReason)]) -> String {
    let mut out = String::new();
    writeln!(out, "{job}: {done} done, {} skipped", skipped.len()).unwrap();

    let by_reason = skipped
        .iter()
        .counts_by(|(_, reason)| reason.label())
        .into_iter()
        .sorted();
    for (label, count) in by_reason {
        writeln!(out, "  {label}: {count}").unwrap();
    }
    for (item, reason) in skipped {
        writeln!(out, "  - {item}: {reason}").unwrap();
    }
    out
}

/// Markdown image snippets per article, in extraction order.
pub fn image_snippets(downloads: &[ImageDownload], alt_text: &str) -> String {
    let mut out = String::new();
    for (slug, group) in &downloads.iter().chunk_by(|d| d.page_slug.clone()) {
        writeln!(out, "SLUG: {slug}").unwrap();
        for download in group {
            writeln!(out, "![{alt_text}]({})", download.web_path).unwrap();
        }
        writeln!(out, "{}", "-".repeat(20)).unwrap();
    }
    out
}

/// Gallery entries as a pretty JSON array.
pub fn gallery_snippet(items: &[GalleryItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download(slug: &str, index: usize) -> ImageDownload {
        ImageDownload {
            page_slug: slug.to_string(),
            index,
            remote_url: format!("https://clinic.test/{index}.jpg"),
            local_path: format!("public/images/{slug}_{index}_x.jpg"),
            web_path: format!("/images/{slug}_{index}_x.jpg"),
            reused: false,
        }
    }

    #[test]
    fn test_summary_groups_reasons() {
        let skipped = vec![
            ("https://a/1".to_string(), SkipReason::MissingTitle),
            ("https://a/2".to_string(), SkipReason::Fetch("timeout".to_string())),
            ("https://a/3".to_string(), SkipReason::MissingTitle),
        ];
        let text = summary("scrape", 5, &skipped);
        assert!(text.starts_with("scrape: 5 done, 3 skipped\n"));
        assert!(text.contains("  fetch: 1\n  missing_title: 2\n"));
        assert!(text.contains("  - https://a/2: fetch failed: timeout\n"));
    }

    #[test]
    fn test_summary_without_skips() {
        assert_eq!(summary("split", 2, &[]), "split: 2 done, 0 skipped\n");
    }

    #[test]
    fn test_image_snippets_grouped_by_slug() {
        let downloads = vec![download("a", 0), download("a", 2), download("b", 1)];
        let text = image_snippets(&downloads, "Zdjęcie");
        assert_eq!(
            text,
            "SLUG: a\n![Zdjęcie](/images/a_0_x.jpg)\n![Zdjęcie](/images/a_2_x.jpg)\n--------------------\n\
             SLUG: b\n![Zdjęcie](/images/b_1_x.jpg)\n--------------------\n"
        );
    }

    #[test]
    fn test_gallery_snippet() {
        let items = vec![GalleryItem {
            id: 4,
            before: "/images/metamorphoses/meta_4_before.jpg".to_string(),
            after: "/images/metamorphoses/meta_4_after.jpg".to_string(),
            title: "Metamorfoza 4".to_string(),
            description: "Opis".to_string(),
            motto: "\"Motto\"".to_string(),
        }];
        let json = gallery_snippet(&items).unwrap();
        assert!(json.contains("\"id\": 4"));
        assert!(json.contains("meta_4_after.jpg"));
    }
}
