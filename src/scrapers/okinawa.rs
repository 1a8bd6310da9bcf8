//! visitokinawajapan.com topic pages.
//!
//! The topic pages are long-form articles without structured cards, so
//! place names are pulled from the visible text with patterns like
//! `"<Name> Beach"` and `"<Name> Castle"`. The article URL is the source.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;

use crate::error::Result;
use crate::models::{Category, LocationDraft, Region};
use crate::scrapers::{REGIONAL_DELAY, ScrapeSession, Scraper, collect};
use crate::services::normalize::normalize_name;
use crate::utils::html::page_text;

const BASE_URL: &str = "https://www.visitokinawajapan.com";

const TOPIC_PAGES: [&str; 5] = [
    "/discover/beaches/",
    "/discover/islands/",
    "/discover/history-and-culture/",
    "/discover/nature/",
    "/discover/things-to-do/",
];

/// (pattern, suffix appended to the captured word, category)
static NAME_PATTERNS: LazyLock<Vec<(Regex, &'static str, Category)>> = LazyLock::new(|| {
    [
        (r"\b([A-Z][a-z]+)\s+Beach\b", "Beach", Category::Nature),
        (r"\b([A-Z][a-z]+)\s+Island\b", "Island", Category::Nature),
        (r"\b([A-Z][a-z]+)\s+Falls\b", "Falls", Category::Nature),
        (r"\b([A-Z][a-z]+)\s+Cape\b", "Cape", Category::Nature),
        (r"\b([A-Z][a-z]+)\s+Castle\b", "Castle", Category::Culture),
        (r"\b([A-Z][a-z]+)\s+Gusuku\b", "Gusuku", Category::Culture),
        (r"\b([A-Z][a-z]+)\s+Aquarium\b", "Aquarium", Category::Attraction),
    ]
    .into_iter()
    .map(|(pattern, suffix, category)| {
        (
            Regex::new(pattern).expect("static name pattern"),
            suffix,
            category,
        )
    })
    .collect()
});

/// Capitalized words that start a sentence rather than name a place.
const STOPWORDS: [&str; 16] = [
    "The", "This", "That", "Each", "Every", "Our", "Its", "Any", "Private", "Public", "Popular",
    "Beautiful", "Best", "Sandy", "White", "Nearby",
];

pub struct OkinawaScraper {
    base_url: String,
}

impl OkinawaScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for OkinawaScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Place names found in a topic page, in order of first appearance.
pub fn extract_places(html: &str, page_url: &str) -> Vec<LocationDraft> {
    let document = Html::parse_document(html);
    let text = page_text(&document);

    let mut found: Vec<(usize, String, Category)> = Vec::new();
    for (pattern, suffix, category) in NAME_PATTERNS.iter() {
        for captures in pattern.captures_iter(&text) {
            let Some(word) = captures.get(1) else {
                continue;
            };
            if STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            found.push((word.start(), format!("{} {}", word.as_str(), suffix), *category));
        }
    }
    found.sort_by_key(|(position, _, _)| *position);

    let mut names = HashSet::new();
    found
        .into_iter()
        .filter(|(_, name, _)| names.insert(normalize_name(name)))
        .map(|(_, name, category)| {
            LocationDraft::new(name, category, Region::Okinawa, page_url)
                .prefecture(Some("Okinawa".to_string()))
        })
        .collect()
}

#[async_trait]
impl Scraper for OkinawaScraper {
    fn name(&self) -> &str {
        "okinawa"
    }

    fn source(&self) -> &str {
        "visitokinawajapan.com"
    }

    fn delay_override(&self) -> Option<Duration> {
        Some(REGIONAL_DELAY)
    }

    async fn scrape(&self, session: &mut ScrapeSession<'_>) -> Result<()> {
        // names are unique across the whole site, not per page
        let mut names: HashSet<String> = HashSet::new();
        let mut seen = HashSet::new();

        for (index, path) in TOPIC_PAGES.iter().enumerate() {
            if index > 0 {
                session.pause().await;
            }
            let url = format!("{}{}", self.base_url, path);
            let Some(html) = session.fetch_page(&url).await.into_page() else {
                continue;
            };

            let drafts: Vec<LocationDraft> = extract_places(&html, &url)
                .into_iter()
                .filter(|draft| names.insert(normalize_name(&draft.name)))
                .collect();
            let added = collect(session, &mut seen, drafts);
            log::info!("  {}: {} places", path, added);
        }

        log::info!("Okinawa: {} places", session.locations().len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RateLimiter;
    use crate::services::testing::StaticFetcher;

    #[test]
    fn test_extract_places() {
        let html = r#"<html><body>
            <h1>Okinawa Beaches</h1>
            <p>Emerald Beach sits beside the aquarium. The Beach is wide.</p>
            <p>Visit Shuri Castle, then Nakagusuku Castle. Churaumi Aquarium is nearby.</p>
            <p>Emerald Beach again, and Kouri Island.</p>
        </body></html>"#;

        let drafts = extract_places(html, "https://okinawa.test/discover/beaches/");
        let names: Vec<&str> = drafts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Emerald Beach",
                "Shuri Castle",
                "Nakagusuku Castle",
                "Churaumi Aquarium",
                "Kouri Island"
            ]
        );
        assert_eq!(drafts[0].category, Category::Nature);
        assert_eq!(drafts[1].category, Category::Culture);
        assert_eq!(drafts[3].category, Category::Attraction);
        assert!(drafts.iter().all(|d| d.prefecture.as_deref() == Some("Okinawa")));
    }

    #[tokio::test]
    async fn test_scrape_dedups_names_across_pages() {
        let fetcher = StaticFetcher::new()
            .page(
                "https://okinawa.test/discover/beaches/",
                "<p>Emerald Beach and Sunset Beach.</p>",
            )
            .page(
                "https://okinawa.test/discover/islands/",
                "<p>Emerald Beach is on the way to Kouri Island.</p>",
            );
        let scraper = OkinawaScraper::with_base_url("https://okinawa.test");
        let mut session = ScrapeSession::new(&fetcher, RateLimiter::disabled(), scraper.source());

        scraper.scrape(&mut session).await.unwrap();

        let names: Vec<&str> = session.locations().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Emerald Beach", "Sunset Beach", "Kouri Island"]);
        // three topic pages are 404s: absent, not failures
        assert_eq!(session.stats().failed_scrapes, 0);
        assert_eq!(fetcher.requested().len(), TOPIC_PAGES.len());
    }
}
