//! japan.travel (JNTO) spot pages, iterated by numeric spot id.
//!
//! Detail pages live at `/en/spot/<id>/` with a dense id range, so the
//! scraper walks ids instead of crawling links. A run of missing pages
//! trips the circuit breaker and ends the walk.
//!
//! Two dedup tiers apply:
//! - within the run: a spot URL is accepted once
//! - across runs: candidates already in the `locations` table are skipped
//!   when the session carries an [`ExistingLocationCache`]

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::models::{Category, JntoConfig, LocationDraft, Region};
use crate::pipeline::dedup::{DedupCandidate, ExistingLocationCache};
use crate::scrapers::{ScrapeSession, Scraper};
use crate::services::CircuitBreaker;
use crate::services::normalize::{
    match_category, normalize_name, prefecture_in_text, region_for_prefecture,
};
use crate::utils::extract_domain;
use crate::utils::html::{document_text, element_text, meta_content, page_text, selector};

static REGION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Hokkaido|Tohoku|Kanto|Chubu|Kansai|Kinki|Chugoku|Shikoku|Kyushu|Okinawa)\b")
        .expect("static region pattern")
});

/// Fields extracted from one spot page.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotPage {
    pub name: String,
    pub url: String,
    pub region: Region,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub category: Category,
    pub description: Option<String>,
}

impl SpotPage {
    fn into_draft(self) -> LocationDraft {
        LocationDraft::new(self.name, self.category, self.region, self.url)
            .prefecture(self.prefecture)
            .city(self.city)
            .description(self.description)
    }
}

pub struct JntoScraper {
    base_url: String,
    max_id: u32,
    miss_limit: usize,
}

impl JntoScraper {
    pub fn new(base_url: impl Into<String>, max_id: u32, miss_limit: usize) -> Self {
        Self {
            base_url: base_url.into(),
            max_id,
            miss_limit,
        }
    }

    pub fn from_config(config: &JntoConfig, test_mode: bool) -> Self {
        Self::new(
            config.base_url.trim_end_matches('/'),
            config.max_id(test_mode),
            config.consecutive_miss_limit,
        )
    }

    fn spot_url(&self, id: u32) -> String {
        format!("{}/en/spot/{}/", self.base_url, id)
    }
}

/// First region named by a path segment of the URL.
fn region_from_path(url: &str) -> Option<Region> {
    let parsed = Url::parse(url).ok()?;
    let segments = parsed.path_segments()?;
    segments
        .filter(|s| !s.is_empty())
        .find_map(|segment| Region::from_text(&segment.replace('-', " ")))
}

/// Earliest region name mentioned in the text.
fn region_in_text(text: &str) -> Option<Region> {
    REGION_PATTERN
        .find(text)
        .and_then(|m| Region::from_text(m.as_str()))
}

/// Region cascade: URL path → breadcrumb → region name in page text →
/// prefecture lookup → Kanto.
fn infer_region(urls: &[&str], breadcrumb: &[String], text: &str) -> Region {
    urls.iter()
        .find_map(|url| region_from_path(url))
        .or_else(|| breadcrumb.iter().find_map(|crumb| region_in_text(crumb)))
        .or_else(|| region_in_text(text))
        .or_else(|| {
            breadcrumb
                .iter()
                .find_map(|crumb| prefecture_in_text(crumb))
                .or_else(|| prefecture_in_text(text))
                .and_then(region_for_prefecture)
        })
        .unwrap_or(Region::Kanto)
}

/// Prefecture from the breadcrumb, and the crumb after it as the city
/// unless that crumb is the spot itself.
fn breadcrumb_place(breadcrumb: &[String], name: &str) -> (Option<String>, Option<String>) {
    let Some(index) = breadcrumb
        .iter()
        .position(|crumb| prefecture_in_text(crumb).is_some())
    else {
        return (None, None);
    };
    let prefecture = prefecture_in_text(&breadcrumb[index]).map(str::to_string);
    let city = breadcrumb
        .get(index + 1)
        .filter(|crumb| normalize_name(crumb) != normalize_name(name))
        .filter(|crumb| prefecture_in_text(crumb).is_none())
        .cloned();
    (prefecture, city)
}

/// Parse a spot page. `None` when the page is a "not found" placeholder.
pub fn parse_spot(html: &str, url: &str) -> Result<Option<SpotPage>> {
    let document = Html::parse_document(html);
    let h1_sel = selector("h1")?;
    let crumb_sel = selector(
        ".breadcrumb li, .breadcrumbs li, nav[aria-label=\"breadcrumb\"] li, .breadcrumb a",
    )?;
    let canonical_sel = selector(r#"link[rel="canonical"]"#)?;
    let keyword_sel = selector(r#"a[href*="keyword"], a[href*="/category/"]"#)?;
    let class_sel = selector(r#"[class*="category"], [class*="tag"]"#)?;
    let body_sel = selector(".spot-description p, article p, main p")?;

    let Some(name) = document_text(&document, &h1_sel) else {
        return Ok(None);
    };
    let lower = name.to_lowercase();
    if lower.contains("not found") || lower.contains("404") {
        return Ok(None);
    }

    let canonical = document
        .select(&canonical_sel)
        .next()
        .and_then(|link| link.value().attr("href"))
        .filter(|href| extract_domain(href) == extract_domain(url))
        .map(str::to_string);
    let og_url = meta_content(&document, "og:url");

    let mut breadcrumb: Vec<String> = Vec::new();
    for crumb in document.select(&crumb_sel) {
        let text = element_text(&crumb);
        if !text.is_empty() && !breadcrumb.contains(&text) {
            breadcrumb.push(text);
        }
    }

    let description = meta_content(&document, "description")
        .or_else(|| document_text(&document, &body_sel));
    let text = page_text(&document);

    let mut urls: Vec<&str> = Vec::new();
    urls.extend(canonical.as_deref());
    urls.extend(og_url.as_deref());
    urls.push(url);
    let region = infer_region(&urls, &breadcrumb, &text);

    // keyword link → category/tag class → name + description → breadcrumb
    let category = document
        .select(&keyword_sel)
        .find_map(|a| match_category(&element_text(&a)))
        .or_else(|| {
            document
                .select(&class_sel)
                .find_map(|e| match_category(&element_text(&e)))
        })
        .or_else(|| {
            match_category(&format!(
                "{} {}",
                name,
                description.as_deref().unwrap_or_default()
            ))
        })
        .or_else(|| breadcrumb.iter().find_map(|crumb| match_category(crumb)))
        .unwrap_or_default();

    let (prefecture, city) = breadcrumb_place(&breadcrumb, &name);
    let prefecture = prefecture.or_else(|| prefecture_in_text(&text).map(str::to_string));

    Ok(Some(SpotPage {
        url: canonical.unwrap_or_else(|| url.to_string()),
        name,
        region,
        prefecture,
        city,
        category,
        description,
    }))
}

/// Within-run bookkeeping: URLs accepted so far and the URLs seen per
/// normalized name.
#[derive(Debug, Default)]
struct RunDedup {
    urls: HashSet<String>,
    names: HashMap<String, HashSet<String>>,
}

impl RunDedup {
    /// Record a spot. Returns `false` only for an exact URL repeat; a name
    /// seen under another URL is tracked and logged but still accepted.
    fn accept(&mut self, name: &str, url: &str) -> bool {
        if !self.urls.insert(url.to_string()) {
            return false;
        }
        let urls = self.names.entry(normalize_name(name)).or_default();
        if !urls.is_empty() {
            log::debug!(
                "Name \"{}\" already seen at {} other URL(s); keeping {}",
                name,
                urls.len(),
                url
            );
        }
        urls.insert(url.to_string());
        true
    }
}

fn existing_duplicate(cache: &ExistingLocationCache, spot: &SpotPage) -> Option<String> {
    cache
        .check(DedupCandidate {
            place_id: None,
            source_url: Some(spot.url.as_str()),
            name: &spot.name,
            region: spot.region.as_str(),
        })
        .map(|reason| reason.to_string())
}

#[async_trait]
impl Scraper for JntoScraper {
    fn name(&self) -> &str {
        "jnto"
    }

    fn source(&self) -> &str {
        "japan.travel"
    }

    fn uses_existing_cache(&self) -> bool {
        true
    }

    async fn scrape(&self, session: &mut ScrapeSession<'_>) -> Result<()> {
        let mut breaker = CircuitBreaker::with_limit(self.miss_limit);
        let mut dedup = RunDedup::default();
        let mut requested: HashSet<String> = HashSet::new();

        log::info!(
            "JNTO: spot ids 1..={} (db dedup: {})",
            self.max_id,
            if session.existing().is_some() { "on" } else { "off" }
        );

        for id in 1..=self.max_id {
            let url = self.spot_url(id);
            if !requested.insert(url.clone()) {
                continue;
            }
            if id > 1 {
                session.pause().await;
            }

            let html = match session.fetch(&url).await {
                Ok(html) => html,
                Err(e) if e.is_not_found() => {
                    breaker.record_miss();
                    if breaker.is_open() {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    log::warn!("Spot {} failed: {}", id, e);
                    session.record_failure();
                    continue;
                }
            };

            let Some(spot) = parse_spot(&html, &url)? else {
                log::debug!("Spot {} is a not-found page", id);
                breaker.record_miss();
                if breaker.is_open() {
                    break;
                }
                continue;
            };
            breaker.record_hit();
            session.record_success();

            if !dedup.accept(&spot.name, &spot.url) {
                log::debug!("Spot {} repeats {}", id, spot.url);
                session.record_duplicate();
                continue;
            }

            if let Some(reason) = session
                .existing()
                .and_then(|cache| existing_duplicate(cache, &spot))
            {
                log::info!("Skipping \"{}\": {}", spot.name, reason);
                session.record_duplicate();
                continue;
            }

            session.add_location(spot.into_draft());
            if id % 100 == 0 {
                log::info!("  spot {}: {} locations so far", id, session.locations().len());
            }
        }

        log::info!(
            "JNTO: {} locations, {} duplicates skipped",
            session.locations().len(),
            session.stats().duplicates_skipped
        );
        Ok(())
    }
}
