// src/models/stats.rs

//! Run statistics and the JSON artifacts built from them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ScrapedLocation, SEED_NOTE};

/// Counters owned by one scraper for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScraperStats {
    pub total_locations: usize,
    pub successful_scrapes: usize,
    pub failed_scrapes: usize,
    #[serde(default)]
    pub duplicates_skipped: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_prefecture: BTreeMap<String, usize>,
    pub by_city: BTreeMap<String, usize>,
    #[serde(default)]
    pub duration_seconds: f64,
}

impl ScraperStats {
    /// Count one accepted location in the histograms.
    pub fn record_location(&mut self, location: &ScrapedLocation) {
        self.total_locations += 1;
        *self
            .by_category
            .entry(location.category.to_string())
            .or_default() += 1;
        if let Some(prefecture) = &location.prefecture {
            *self.by_prefecture.entry(prefecture.clone()).or_default() += 1;
        }
        if let Some(city) = &location.city {
            *self.by_city.entry(city.clone()).or_default() += 1;
        }
    }

    pub fn record_success(&mut self) {
        self.successful_scrapes += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_scrapes += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates_skipped += 1;
    }
}

/// Header of a single scraper's artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMetadata {
    pub scraper: String,
    pub source: String,
    pub scraped_at: DateTime<Utc>,
    pub total_locations: usize,
    pub duration_seconds: f64,
    pub note: String,
}

/// Everything one scraper produced: `tmp/<name>-scraped.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutput {
    pub metadata: ScrapeMetadata,
    pub locations: Vec<ScrapedLocation>,
    pub stats: ScraperStats,
}

impl ScrapeOutput {
    pub fn new(
        scraper: &str,
        source: &str,
        locations: Vec<ScrapedLocation>,
        stats: ScraperStats,
    ) -> Self {
        Self {
            metadata: ScrapeMetadata {
                scraper: scraper.to_string(),
                source: source.to_string(),
                scraped_at: Utc::now(),
                total_locations: locations.len(),
                duration_seconds: stats.duration_seconds,
                note: SEED_NOTE.to_string(),
            },
            locations,
            stats,
        }
    }
}

/// Per-scraper line in the combined artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperSummary {
    pub name: String,
    pub source: String,
    pub location_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ScraperStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregates over the union of all scrapers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CombinedStats {
    pub total_locations: usize,
    pub successful_scrapers: usize,
    pub failed_scrapers: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_region: BTreeMap<String, usize>,
    pub by_prefecture: BTreeMap<String, usize>,
    pub duration_seconds: f64,
}

impl CombinedStats {
    /// Build the histograms from the merged location list.
    pub fn from_locations(locations: &[ScrapedLocation]) -> Self {
        let mut stats = Self {
            total_locations: locations.len(),
            ..Self::default()
        };
        for location in locations {
            *stats
                .by_category
                .entry(location.category.to_string())
                .or_default() += 1;
            *stats
                .by_region
                .entry(location.region.to_string())
                .or_default() += 1;
            if let Some(prefecture) = &location.prefecture {
                *stats.by_prefecture.entry(prefecture.clone()).or_default() += 1;
            }
        }
        stats
    }
}

/// `tmp/all-scraped-locations.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedOutput {
    pub scraped_at: DateTime<Utc>,
    pub note: String,
    pub scrapers: Vec<ScraperSummary>,
    pub locations: Vec<ScrapedLocation>,
    pub stats: CombinedStats,
}

impl CombinedOutput {
    pub fn failed(&self) -> impl Iterator<Item = &ScraperSummary> {
        self.scrapers.iter().filter(|s| s.error.is_some())
    }
}
