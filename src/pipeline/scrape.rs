// src/pipeline/scrape.rs

//! Single-scraper run: scrape, time, write artifacts, report.

use std::time::Instant;

use crate::error::Result;
use crate::models::{Config, ScrapeOutput};
use crate::pipeline::dedup::ExistingLocationCache;
use crate::scrapers::{ScrapeSession, Scraper};
use crate::services::{PageFetcher, RateLimiter};
use crate::storage::ArtifactWriter;
use crate::utils::console;

/// Run one scraper to completion and write `<name>-scraped.{json,ts}`.
///
/// An `Err` from the scraper body aborts the run; whatever it collected
/// before failing is dropped.
pub async fn run_scraper(
    scraper: &dyn Scraper,
    fetcher: &dyn PageFetcher,
    config: &Config,
    existing: Option<&ExistingLocationCache>,
    writer: &ArtifactWriter,
) -> Result<ScrapeOutput> {
    console::header(&format!("Scraping {} ({})", scraper.name(), scraper.source()));

    let delay = scraper
        .delay_override()
        .unwrap_or_else(|| config.scraper.request_delay());
    let mut session = ScrapeSession::new(fetcher, RateLimiter::new(delay), scraper.source())
        .with_existing(existing);

    let started = Instant::now();
    scraper.scrape(&mut session).await?;
    let (locations, mut stats) = session.finish();
    stats.duration_seconds = started.elapsed().as_secs_f64();

    let output = ScrapeOutput::new(scraper.name(), scraper.source(), locations, stats);
    writer.write_scrape_output(scraper.name(), &output).await?;

    report(&output);
    console::success(&format!("{} complete", scraper.name()));

    Ok(output)
}

fn report(output: &ScrapeOutput) {
    let stats = &output.stats;
    console::summary(
        &output.metadata.scraper,
        &[
            ("Locations", stats.total_locations.to_string()),
            ("Pages/items fetched", stats.successful_scrapes.to_string()),
            ("Failures", stats.failed_scrapes.to_string()),
            ("Duplicates skipped", stats.duplicates_skipped.to_string()),
            ("Duration", format!("{:.1}s", stats.duration_seconds)),
        ],
    );
    if !stats.by_category.is_empty() {
        console::breakdown("By category", &stats.by_category);
    }
    if !stats.by_prefecture.is_empty() {
        console::breakdown("By prefecture", &stats.by_prefecture);
    }
}
