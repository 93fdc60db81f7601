//! Per-item results for batch jobs.
//!
//! Every unit of work (a page, an image, a file, a feed item) ends in an
//! [`Outcome`]: either the produced value or a typed [`SkipReason`]. A skip
//! is logged and counted; it never aborts the run.

use thiserror::Error;

/// Why a unit of work was skipped.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("no title found")]
    MissingTitle,

    #[error("no link found")]
    MissingLink,

    #[error("no content region found")]
    NoContentRegion,

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("input not found: {0}")]
    NotFound(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

impl SkipReason {
    /// Short stable label used to group skips in reports.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Fetch(_) => "fetch",
            SkipReason::MissingTitle => "missing_title",
            SkipReason::MissingLink => "missing_link",
            SkipReason::NoContentRegion => "no_content_region",
            SkipReason::HttpStatus(_) => "http_status",
            SkipReason::NotFound(_) => "not_found",
            SkipReason::Image(_) => "image",
            SkipReason::Pdf(_) => "pdf",
            SkipReason::Io(_) => "io",
            SkipReason::AlreadyExists(_) => "already_exists",
        }
    }
}

/// Result of processing one item.
#[derive(Debug)]
pub enum Outcome<T> {
    Done(T),
    Skipped {
        /// Identifying path or address of the skipped item.
        item: String,
        reason: SkipReason,
    },
}

impl<T> Outcome<T> {
    pub fn skipped(item: impl Into<String>, reason: SkipReason) -> Self {
        Outcome::Skipped {
            item: item.into(),
            reason,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    #[cfg(test)]
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Skipped { .. } => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Outcome::Done(_) => None,
            Outcome::Skipped { reason, .. } => Some(reason),
        }
    }
}

/// Split outcomes into produced values and `(item, reason)` skips, preserving order.
pub fn partition<T>(outcomes: Vec<Outcome<T>>) -> (Vec<T>, Vec<(String, SkipReason)>) {
    let mut done = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Done(value) => done.push(value),
            Outcome::Skipped { item, reason } => skipped.push((item, reason)),
        }
    }
    (done, skipped)
}
