//! Per-site scrapers.
//!
//! Every site is an independent strategy object implementing [`Scraper`].
//! Shared collaborators (fetcher, rate limiter, collector, optional dedup
//! cache) are injected through a [`ScrapeSession`] rather than inherited.
//!
//! | Scraper | Site | Pagination |
//! |---------|------|------------|
//! | `hokkaido` | visit-hokkaido.jp | `?page=N` |
//! | `tohoku` | tohokukanko.jp | `/page:N` |
//! | `central-japan` | go-centraljapan.jp | `?page=N`, capped |
//! | `kyushu` | visit-kyushu.com | `?page=N` |
//! | `okinawa` | visitokinawajapan.com | fixed pages, regex over text |
//! | `shikoku` | shikoku-tourism.com | `?page=N`, capped |
//! | `chugoku` | into-you.jp | per category × `?page=N` |
//! | `kansai` | the-kansai-guide.com | `/page/N/`, capped |
//! | `jnto` | japan.travel | spot id 1..=max |

mod central_japan;
mod chugoku;
mod hokkaido;
mod jnto;
mod kansai;
mod kyushu;
mod okinawa;
mod session;
mod shikoku;
mod tohoku;

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Config, LocationDraft};
use crate::services::normalize::normalize_name;

pub use central_japan::CentralJapanScraper;
pub use chugoku::ChugokuScraper;
pub use hokkaido::HokkaidoScraper;
pub use jnto::JntoScraper;
pub use kansai::KansaiScraper;
pub use kyushu::KyushuScraper;
pub use okinawa::OkinawaScraper;
pub use session::{Fetched, ScrapeSession};
pub use shikoku::ShikokuScraper;
pub use tohoku::TohokuScraper;

/// Pause between requests used by the regional tourism-board scrapers.
pub const REGIONAL_DELAY: Duration = Duration::from_millis(2000);

/// Names accepted by [`by_name`], in orchestrator order, then `jnto`.
pub const SCRAPER_NAMES: [&str; 9] = [
    "hokkaido",
    "tohoku",
    "central-japan",
    "kyushu",
    "okinawa",
    "shikoku",
    "chugoku",
    "kansai",
    "jnto",
];

/// One site's extraction strategy.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Short name used for artifact files (`tmp/<name>-scraped.json`).
    fn name(&self) -> &str;

    /// Provenance recorded on every location (usually the site's domain).
    fn source(&self) -> &str;

    /// Per-scraper request delay; `None` uses the configured default.
    fn delay_override(&self) -> Option<Duration> {
        None
    }

    /// Whether the run should load the database dedup cache.
    fn uses_existing_cache(&self) -> bool {
        false
    }

    /// Walk the site, adding locations to the session.
    ///
    /// Per-page and per-item failures are counted in the session stats and
    /// skipped. Returning `Err` aborts the run.
    async fn scrape(&self, session: &mut ScrapeSession<'_>) -> Result<()>;
}

/// The eight regional scrapers in orchestrator order.
pub fn regional() -> Vec<Box<dyn Scraper>> {
    vec![
        Box::new(HokkaidoScraper::new()),
        Box::new(TohokuScraper::new()),
        Box::new(CentralJapanScraper::new()),
        Box::new(KyushuScraper::new()),
        Box::new(OkinawaScraper::new()),
        Box::new(ShikokuScraper::new()),
        Box::new(ChugokuScraper::new()),
        Box::new(KansaiScraper::new()),
    ]
}

/// Look up a scraper by its short name.
pub fn by_name(name: &str, config: &Config, test_mode: bool) -> Result<Box<dyn Scraper>> {
    let scraper: Box<dyn Scraper> = match name {
        "hokkaido" => Box::new(HokkaidoScraper::new()),
        "tohoku" => Box::new(TohokuScraper::new()),
        "central-japan" | "chubu" => Box::new(CentralJapanScraper::new()),
        "kyushu" => Box::new(KyushuScraper::new()),
        "okinawa" => Box::new(OkinawaScraper::new()),
        "shikoku" => Box::new(ShikokuScraper::new()),
        "chugoku" => Box::new(ChugokuScraper::new()),
        "kansai" => Box::new(KansaiScraper::new()),
        "jnto" => Box::new(JntoScraper::from_config(&config.jnto, test_mode)),
        other => {
            return Err(AppError::config(format!(
                "Unknown scraper '{}'. Available: {}",
                other,
                SCRAPER_NAMES.join(", ")
            )));
        }
    };
    Ok(scraper)
}

/// Key for within-run duplicate suppression. Includes the name so that
/// several places listed on one page without their own link stay distinct.
fn seen_key(draft: &LocationDraft) -> String {
    format!("{}#{}", draft.source_url, normalize_name(&draft.name))
}

/// Add drafts not already in `seen`. Unnamed drafts count as failed items.
/// Returns how many were added.
pub(crate) fn collect(
    session: &mut ScrapeSession<'_>,
    seen: &mut HashSet<String>,
    drafts: Vec<LocationDraft>,
) -> usize {
    let mut added = 0;
    for draft in drafts {
        if draft.name.trim().is_empty() {
            log::warn!("  could not read a name from an item on {}", draft.source_url);
            session.record_failure();
            continue;
        }
        if !seen.insert(seen_key(&draft)) {
            continue;
        }
        if session.add_location(draft) {
            added += 1;
        } else {
            session.record_failure();
        }
    }
    added
}

/// Walk numbered listing pages. Stops at a missing page or at a page that
/// adds nothing new; a page that fails to load is skipped.
pub(crate) async fn paginate<U, P>(
    session: &mut ScrapeSession<'_>,
    pages: RangeInclusive<u32>,
    seen: &mut HashSet<String>,
    page_url: U,
    parse: P,
) -> Result<usize>
where
    U: Fn(u32) -> String + Send + Sync,
    P: Fn(&str, &str) -> Result<Vec<LocationDraft>> + Send + Sync,
{
    let last = *pages.end();
    let mut total = 0;
    for page in pages {
        let url = page_url(page);
        let html = match session.fetch_page(&url).await {
            Fetched::Page(html) => html,
            Fetched::Missing => {
                log::info!("  page {} not found, end of listing", page);
                break;
            }
            Fetched::Failed => {
                session.pause().await;
                continue;
            }
        };

        let drafts = parse(&html, &url)?;
        let added = collect(session, seen, drafts);
        log::info!("  page {}: {} new locations", page, added);
        total += added;
        if added == 0 {
            break;
        }
        if page < last {
            session.pause().await;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_order() {
        let names: Vec<String> = regional().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, SCRAPER_NAMES[..8].to_vec());
        assert!(regional().iter().all(|s| s.delay_override() == Some(REGIONAL_DELAY)));
    }

    #[test]
    fn test_by_name() {
        let config = Config::default();
        for name in SCRAPER_NAMES {
            assert_eq!(by_name(name, &config, true).unwrap().name(), name);
        }
        assert!(by_name("mars", &config, false).is_err());
    }

    #[tokio::test]
    async fn test_paginate_stops_when_page_adds_nothing() {
        use crate::models::{Category, Region};
        use crate::services::RateLimiter;
        use crate::services::testing::StaticFetcher;

        let fetcher = StaticFetcher::new()
            .page("https://p.test/1", "a,b")
            .page("https://p.test/2", "b,c")
            .page("https://p.test/3", "c")
            .page("https://p.test/4", "d");
        let mut session = ScrapeSession::new(&fetcher, RateLimiter::disabled(), "p.test");
        let mut seen = HashSet::new();

        let added = paginate(
            &mut session,
            1..=10,
            &mut seen,
            |page| format!("https://p.test/{page}"),
            |html, _| {
                Ok(html
                    .split(',')
                    .map(|name| {
                        LocationDraft::new(name, Category::Nature, Region::Kanto, "https://p.test/")
                    })
                    .collect())
            },
        )
        .await
        .unwrap();

        assert_eq!(added, 3);
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_paginate_skips_failed_and_stops_at_missing() {
        use crate::models::{Category, Region};
        use crate::services::RateLimiter;
        use crate::services::testing::StaticFetcher;

        let fetcher = StaticFetcher::new()
            .page("https://p.test/1", "a")
            .failing("https://p.test/2", "timeout")
            .page("https://p.test/3", "b");
        let mut session = ScrapeSession::new(&fetcher, RateLimiter::disabled(), "p.test");
        let mut seen = HashSet::new();

        let added = paginate(
            &mut session,
            1..=10,
            &mut seen,
            |page| format!("https://p.test/{page}"),
            |html, url| Ok(vec![LocationDraft::new(html, Category::Food, Region::Kanto, url)]),
        )
        .await
        .unwrap();

        assert_eq!(added, 2);
        // page 4 is the 404 that ends the walk
        assert_eq!(fetcher.requested().len(), 4);
        assert_eq!(session.stats().failed_scrapes, 1);
    }

    #[test]
    fn test_collect_counts_unnamed_items() {
        use crate::models::{Category, Region};
        use crate::services::RateLimiter;
        use crate::services::testing::StaticFetcher;

        let fetcher = StaticFetcher::new();
        let mut session = ScrapeSession::new(&fetcher, RateLimiter::disabled(), "p.test");
        let mut seen = HashSet::new();
        let url = "https://p.test/list";

        let added = collect(
            &mut session,
            &mut seen,
            vec![
                LocationDraft::new("", Category::Nature, Region::Kanto, url),
                LocationDraft::new("  ", Category::Nature, Region::Kanto, url),
                LocationDraft::new("Meiji Jingu", Category::Culture, Region::Kanto, url),
            ],
        );

        assert_eq!(added, 1);
        assert_eq!(session.stats().failed_scrapes, 2);
    }

    #[test]
    fn test_only_jnto_uses_cache() {
        let config = Config::default();
        assert!(by_name("jnto", &config, false).unwrap().uses_existing_cache());
        assert!(regional().iter().all(|s| !s.uses_existing_cache()));
    }
}
