//! HTTP fetching with a fixed politeness delay.
//!
//! The module uses a trait-based design so the jobs can run against the real
//! site or an in-memory fake in tests:
//! - [`FetchAsync`]: Core trait for fetching page text and raw bytes
//! - [`HttpFetcher`]: `reqwest` client with the configured user agent
//! - [`Paced`]: Decorator that sleeps before every request except the first
//!
//! # Pacing
//!
//! Requests are issued strictly one at a time. `Paced` only spaces them out;
//! there are no retries, no adaptive backoff and no timeouts beyond the
//! transport defaults.

use crate::config::SiteConfig;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Raw response body together with its HTTP status.
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Trait for async page and asset fetching.
pub trait FetchAsync {
    /// Fetch a page as text. Non-success statuses are errors.
    async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>>;

    /// Fetch raw bytes. The status is returned rather than turned into an error
    /// so callers can report it.
    async fn fetch_bytes(&self, url: &str) -> Result<FetchedBytes, Box<dyn Error>>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = self.client.get(url).send().await?.error_for_status()?;
        let text = res.text().await?;
        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, bytes = text.len(), "Fetched page");
        Ok(text)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_bytes(&self, url: &str) -> Result<FetchedBytes, Box<dyn Error>> {
        let res = self.client.get(url).send().await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();
        Ok(FetchedBytes { status, body })
    }
}

/// Wrapper that inserts a fixed pause before every request but the first.
pub struct Paced<T> {
    inner: T,
    delay: Duration,
    started: AtomicBool,
}

impl<T> Paced<T> {
    pub fn new(inner: T, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            started: AtomicBool::new(false),
        }
    }

    async fn pause(&self) {
        if self.started.swap(true, Ordering::SeqCst) && !self.delay.is_zero() {
            debug!(?self.delay, "Politeness delay");
            sleep(self.delay).await;
        }
    }
}

impl<T> fmt::Debug for Paced<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paced")
            .field("delay", &self.delay)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}

impl<T: FetchAsync> FetchAsync for Paced<T> {
    async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        self.pause().await;
        let res = self.inner.fetch_text(url).await;
        if let Err(e) = &res {
            warn!(%url, error = %e, "Fetch failed");
        }
        res
    }

    async fn fetch_bytes(&self, url: &str) -> Result<FetchedBytes, Box<dyn Error>> {
        self.pause().await;
        self.inner.fetch_bytes(url).await
    }
}

/// Build the paced HTTP fetcher described by the site configuration.
pub fn site_fetcher(site: &SiteConfig) -> Result<Paced<HttpFetcher>, Box<dyn Error>> {
    let http = HttpFetcher::new(&site.user_agent)?;
    Ok(Paced::new(http, Duration::from_millis(site.delay_ms)))
}
