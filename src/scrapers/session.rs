//! Per-run context handed to a scraper.

use chrono::Utc;

use crate::error::Result;
use crate::models::{LocationDraft, SEED_NOTE, ScrapedLocation, ScraperStats};
use crate::pipeline::dedup::ExistingLocationCache;
use crate::services::normalize::{clean_text, truncate_description};
use crate::services::{PageFetcher, RateLimiter};

/// Outcome of [`ScrapeSession::fetch_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Page(String),
    Missing,
    Failed,
}

impl Fetched {
    pub fn into_page(self) -> Option<String> {
        match self {
            Fetched::Page(html) => Some(html),
            Fetched::Missing | Fetched::Failed => None,
        }
    }
}

/// Everything a scraper needs for one run: the fetcher, pacing, the
/// location collector, and the optional database snapshot for dedup.
pub struct ScrapeSession<'a> {
    fetcher: &'a dyn PageFetcher,
    limiter: RateLimiter,
    source: String,
    existing: Option<&'a ExistingLocationCache>,
    locations: Vec<ScrapedLocation>,
    stats: ScraperStats,
}

impl<'a> ScrapeSession<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, limiter: RateLimiter, source: impl Into<String>) -> Self {
        Self {
            fetcher,
            limiter,
            source: source.into(),
            existing: None,
            locations: Vec::new(),
            stats: ScraperStats::default(),
        }
    }

    /// Enable cross-run deduplication against a database snapshot.
    pub fn with_existing(mut self, existing: Option<&'a ExistingLocationCache>) -> Self {
        self.existing = existing;
        self
    }

    pub fn existing(&self) -> Option<&'a ExistingLocationCache> {
        self.existing
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Raw fetch; the caller decides how to count the outcome.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        self.fetcher.fetch_html(url).await
    }

    /// Fetch a page and count the outcome. A 404 is reported as
    /// [`Fetched::Missing`] and is not a failure; any other error is logged
    /// and counted.
    pub async fn fetch_page(&mut self, url: &str) -> Fetched {
        match self.fetch(url).await {
            Ok(html) => {
                self.stats.record_success();
                Fetched::Page(html)
            }
            Err(e) if e.is_not_found() => {
                log::debug!("Not found: {}", url);
                Fetched::Missing
            }
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", url, e);
                self.stats.record_failure();
                Fetched::Failed
            }
        }
    }

    /// Politeness pause between requests.
    pub async fn pause(&self) {
        self.limiter.wait().await;
    }

    /// Stamp provenance and add a location. Returns `false` when the draft
    /// has no usable name.
    pub fn add_location(&mut self, draft: LocationDraft) -> bool {
        let name = clean_text(&draft.name);
        if name.is_empty() {
            log::debug!("Skipping unnamed location from {}", draft.source_url);
            return false;
        }

        let location = ScrapedLocation {
            name,
            category: draft.category,
            region: draft.region,
            prefecture: draft.prefecture.map(|p| clean_text(&p)).filter(|p| !p.is_empty()),
            city: draft.city.map(|c| clean_text(&c)).filter(|c| !c.is_empty()),
            source: self.source.clone(),
            source_url: draft.source_url,
            description: draft.description.as_deref().and_then(truncate_description),
            scraped_at: Utc::now(),
            note: SEED_NOTE.to_string(),
        };
        self.stats.record_location(&location);
        self.locations.push(location);
        true
    }

    pub fn record_success(&mut self) {
        self.stats.record_success();
    }

    /// Count an item that could not be extracted.
    pub fn record_failure(&mut self) {
        self.stats.record_failure();
    }

    pub fn record_duplicate(&mut self) {
        self.stats.record_duplicate();
    }

    pub fn locations(&self) -> &[ScrapedLocation] {
        &self.locations
    }

    pub fn stats(&self) -> &ScraperStats {
        &self.stats
    }

    pub fn finish(self) -> (Vec<ScrapedLocation>, ScraperStats) {
        (self.locations, self.stats)
    }
}
