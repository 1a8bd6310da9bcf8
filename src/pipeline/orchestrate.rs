// src/pipeline/orchestrate.rs

//! Sequential run of every scraper into one combined artifact.

use std::time::Instant;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{CombinedOutput, CombinedStats, Config, SEED_NOTE, ScraperSummary};
use crate::pipeline::dedup::ExistingLocationCache;
use crate::pipeline::scrape::run_scraper;
use crate::scrapers::Scraper;
use crate::services::PageFetcher;
use crate::storage::ArtifactWriter;
use crate::utils::console;

/// Run the scrapers one after another.
///
/// A failing scraper is recorded with its error and the loop moves on; its
/// partial results are not merged. `existing` is only handed to scrapers
/// that ask for the database cache.
pub async fn run_all(
    scrapers: &[Box<dyn Scraper>],
    fetcher: &dyn PageFetcher,
    config: &Config,
    existing: Option<&ExistingLocationCache>,
    writer: &ArtifactWriter,
) -> Result<CombinedOutput> {
    console::header("Running all scrapers");
    let started = Instant::now();
    let total = scrapers.len();

    let mut summaries = Vec::with_capacity(total);
    let mut locations = Vec::new();

    for (index, scraper) in scrapers.iter().enumerate() {
        console::step(index + 1, total, scraper.name());
        let cache = existing.filter(|_| scraper.uses_existing_cache());

        match run_scraper(scraper.as_ref(), fetcher, config, cache, writer).await {
            Ok(output) => {
                summaries.push(ScraperSummary {
                    name: scraper.name().to_string(),
                    source: scraper.source().to_string(),
                    location_count: output.locations.len(),
                    stats: Some(output.stats),
                    error: None,
                });
                locations.extend(output.locations);
            }
            Err(e) => {
                log::error!("Scraper {} failed: {}", scraper.name(), e);
                summaries.push(ScraperSummary {
                    name: scraper.name().to_string(),
                    source: scraper.source().to_string(),
                    location_count: 0,
                    stats: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let failed = summaries.iter().filter(|s| s.error.is_some()).count();
    let mut stats = CombinedStats::from_locations(&locations);
    stats.successful_scrapers = total - failed;
    stats.failed_scrapers = failed;
    stats.duration_seconds = started.elapsed().as_secs_f64();

    let output = CombinedOutput {
        scraped_at: Utc::now(),
        note: SEED_NOTE.to_string(),
        scrapers: summaries,
        locations,
        stats,
    };
    writer.write_combined(&output).await?;
    report(&output);

    Ok(output)
}

/// `Err(ScrapersFailed)` when any scraper in the run recorded an error.
pub fn ensure_all_succeeded(output: &CombinedOutput) -> Result<()> {
    let failed = output.failed().count();
    if failed > 0 {
        return Err(AppError::ScrapersFailed {
            failed,
            total: output.scrapers.len(),
        });
    }
    Ok(())
}

fn report(output: &CombinedOutput) {
    console::separator();
    for summary in &output.scrapers {
        match &summary.error {
            None => console::sub_item(&format!(
                "✓ {:<15} {} locations",
                summary.name, summary.location_count
            )),
            Some(error) => console::sub_item(&format!("✗ {:<15} {}", summary.name, error)),
        }
    }

    let stats = &output.stats;
    console::summary(
        "All scrapers",
        &[
            ("Total locations", stats.total_locations.to_string()),
            ("Successful scrapers", stats.successful_scrapers.to_string()),
            ("Failed scrapers", stats.failed_scrapers.to_string()),
            ("Duration", format!("{:.1}s", stats.duration_seconds)),
        ],
    );
    console::breakdown("By region", &stats.by_region);
    console::breakdown("By category", &stats.by_category);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, LocationDraft, Region};
    use crate::scrapers::ScrapeSession;
    use crate::services::testing::StaticFetcher;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Stub {
        name: &'static str,
        region: Region,
        spots: &'static [&'static str],
        fail: bool,
    }

    #[async_trait]
    impl Scraper for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn source(&self) -> &str {
            "stub.test"
        }

        fn delay_override(&self) -> Option<Duration> {
            Some(Duration::ZERO)
        }

        async fn scrape(&self, session: &mut ScrapeSession<'_>) -> Result<()> {
            for spot in self.spots {
                session.add_location(LocationDraft::new(
                    *spot,
                    Category::Nature,
                    self.region,
                    format!("https://stub.test/{}/{}", self.name, spot),
                ));
            }
            if self.fail {
                return Err(AppError::scrape(self.name, "site unreachable"));
            }
            Ok(())
        }
    }

    fn stub(name: &'static str, region: Region, spots: &'static [&'static str], fail: bool) -> Box<dyn Scraper> {
        Box::new(Stub {
            name,
            region,
            spots,
            fail,
        })
    }

    #[tokio::test]
    async fn test_failed_scraper_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let fetcher = StaticFetcher::new();
        let scrapers = vec![
            stub("hokkaido", Region::Hokkaido, &["Lake Toya", "Shiretoko"], false),
            stub("tohoku", Region::Tohoku, &["Ignored"], true),
            stub("kyushu", Region::Kyushu, &["Mount Aso"], false),
        ];

        let output = run_all(&scrapers, &fetcher, &Config::default(), None, &writer)
            .await
            .unwrap();

        let names: Vec<&str> = output.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Lake Toya", "Shiretoko", "Mount Aso"]);
        assert_eq!(output.stats.failed_scrapers, 1);
        assert_eq!(output.stats.successful_scrapers, 2);
        assert_eq!(output.stats.by_region["Hokkaido"], 2);
        assert!(output.scrapers[1].error.as_deref().unwrap().contains("site unreachable"));
        assert!(dir.path().join("all-scraped-locations.json").exists());

        let err = ensure_all_succeeded(&output).unwrap_err();
        assert!(matches!(err, AppError::ScrapersFailed { failed: 1, total: 3 }));
    }

    #[tokio::test]
    async fn test_all_succeeded() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let fetcher = StaticFetcher::new();
        let scrapers = vec![stub("okinawa", Region::Okinawa, &["Kouri Island"], false)];

        let output = run_all(&scrapers, &fetcher, &Config::default(), None, &writer)
            .await
            .unwrap();

        assert_eq!(output.stats.total_locations, 1);
        assert!(ensure_all_succeeded(&output).is_ok());
    }
}
