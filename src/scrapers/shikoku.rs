//! shikoku-tourism.com "see and do" listing (Drupal views, zero-based
//! `?page=N`).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::Result;
use crate::models::{Category, LocationDraft, Region};
use crate::scrapers::{REGIONAL_DELAY, ScrapeSession, Scraper, paginate};
use crate::services::normalize::{normalize_prefecture, prefecture_in_text};
use crate::utils::html::{first_text, selector};
use crate::utils::resolve;

const BASE_URL: &str = "https://shikoku-tourism.com";

/// Ten pages of twelve rows covers the curated list.
const MAX_PAGES: u32 = 10;

/// Checked in order against name + teaser; the first list with a hit wins.
const KEYWORDS: [(Category, &[&str]); 5] = [
    (
        Category::Culture,
        &[
            "temple", "shrine", "castle", "museum", "pilgrim", "henro", "kabuki", "theater",
            "theatre", "historic", "samurai", "-ji",
        ],
    ),
    (
        Category::Nature,
        &[
            "valley", "gorge", "garden", "park", "mountain", "river", "vine bridge", "beach",
            "cape", "falls", "waterfall", "island", "whirlpool", "onsen", "hot spring",
        ],
    ),
    (
        Category::Food,
        &["udon", "restaurant", "market", "sake", "brewery", "citrus", "yuzu", "katsuo"],
    ),
    (
        Category::Shopping,
        &["shopping", "arcade", "craft", "indigo", "washi", "shop"],
    ),
    (Category::Hotel, &["ryokan", "hotel", "inn"]),
];

/// Keyword scan over lowercase text, defaulting to `attraction`.
fn classify(text: &str) -> Category {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

pub struct ShikokuScraper {
    base_url: String,
}

impl ShikokuScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/en/see-and-do?page={}", self.base_url, page)
    }
}

impl Default for ShikokuScraper {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<LocationDraft>> {
    let document = Html::parse_document(html);
    let row_sel = selector(".views-row")?;
    let title_sel = selector(".views-field-title a, .views-field-title")?;
    let link_sel = selector(".views-field-title a[href], a[href]")?;
    let prefecture_sel = selector(".views-field-field-prefecture, .prefecture")?;
    let body_sel = selector(".views-field-body, .views-field-field-teaser")?;

    let mut drafts = Vec::new();
    for row in document.select(&row_sel) {
        let name = first_text(&row, &title_sel).unwrap_or_default();
        let url = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(page_url, href))
            .unwrap_or_else(|| page_url.to_string());
        let description = first_text(&row, &body_sel);
        let prefecture = first_text(&row, &prefecture_sel).map(|text| {
            prefecture_in_text(&text)
                .map(str::to_string)
                .unwrap_or_else(|| normalize_prefecture(&text))
        });

        let haystack = format!("{} {}", name, description.as_deref().unwrap_or_default());
        drafts.push(
            LocationDraft::new(name, classify(&haystack), Region::Shikoku, url)
                .prefecture(prefecture)
                .description(description),
        );
    }
    Ok(drafts)
}

#[async_trait]
impl Scraper for ShikokuScraper {
    fn name(&self) -> &str {
        "shikoku"
    }

    fn source(&self) -> &str {
        "shikoku-tourism.com"
    }

    fn delay_override(&self) -> Option<Duration> {
        Some(REGIONAL_DELAY)
    }

    async fn scrape(&self, session: &mut ScrapeSession<'_>) -> Result<()> {
        let mut seen = HashSet::new();
        let added = paginate(
            session,
            0..=MAX_PAGES - 1,
            &mut seen,
            |page| self.page_url(page),
            parse_listing,
        )
        .await?;
        log::info!("Shikoku: {} spots", added);
        Ok(())
    }
}
