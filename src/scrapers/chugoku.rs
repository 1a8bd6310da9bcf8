//! into-you.jp (Chugoku region DMO).
//!
//! Spots are browsed per category; the category is taken from which
//! listing the spot appears in. The same spot may be listed under several
//! categories, and the first listing wins.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::Result;
use crate::models::{Category, LocationDraft, Region};
use crate::scrapers::{REGIONAL_DELAY, ScrapeSession, Scraper, paginate};
use crate::services::normalize::{clean_text, normalize_prefecture, prefecture_in_text};
use crate::utils::html::{first_text, selector};
use crate::utils::resolve;

const BASE_URL: &str = "https://www.into-you.jp";

const MAX_PAGES_PER_CATEGORY: u32 = 5;

/// Listing slug → category.
const CATEGORIES: [(&str, Category); 6] = [
    ("history-culture", Category::Culture),
    ("nature-scenery", Category::Nature),
    ("food-drink", Category::Food),
    ("shopping", Category::Shopping),
    ("experiences", Category::Attraction),
    ("onsen", Category::Nature),
];

pub struct ChugokuScraper {
    base_url: String,
}

impl ChugokuScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, slug: &str, page: u32) -> String {
        format!("{}/en/category/{}/?page={}", self.base_url, slug, page)
    }
}

impl Default for ChugokuScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// `"Hiroshima / Onomichi"` → (prefecture, city).
fn split_area(area: &str) -> (Option<String>, Option<String>) {
    let mut parts = area.splitn(2, '/').map(clean_text);
    let first = parts.next().filter(|p| !p.is_empty());
    let city = parts.next().filter(|p| !p.is_empty());
    let prefecture = first.map(|p| {
        prefecture_in_text(&p)
            .map(str::to_string)
            .unwrap_or_else(|| normalize_prefecture(&p))
    });
    (prefecture, city)
}

pub fn parse_listing(
    html: &str,
    page_url: &str,
    category: Category,
) -> Result<Vec<LocationDraft>> {
    let document = Html::parse_document(html);
    let card_sel = selector(".spot-list__item, .card")?;
    let name_sel = selector("h3, .card__title")?;
    let link_sel = selector("a[href]")?;
    let area_sel = selector(".area, .card__area")?;
    let desc_sel = selector(".card__text, p")?;

    let mut drafts = Vec::new();
    for card in document.select(&card_sel) {
        let name = first_text(&card, &name_sel).unwrap_or_default();
        let url = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(page_url, href))
            .unwrap_or_else(|| page_url.to_string());
        let (prefecture, city) = first_text(&card, &area_sel)
            .map(|area| split_area(&area))
            .unwrap_or_default();

        drafts.push(
            LocationDraft::new(name, category, Region::Chugoku, url)
                .prefecture(prefecture)
                .city(city)
                .description(first_text(&card, &desc_sel)),
        );
    }
    Ok(drafts)
}

#[async_trait]
impl Scraper for ChugokuScraper {
    fn name(&self) -> &str {
        "chugoku"
    }

    fn source(&self) -> &str {
        "into-you.jp"
    }

    fn delay_override(&self) -> Option<Duration> {
        Some(REGIONAL_DELAY)
    }

    async fn scrape(&self, session: &mut ScrapeSession<'_>) -> Result<()> {
        // shared across categories so a spot keeps its first category
        let mut seen = HashSet::new();

        for (index, (slug, category)) in CATEGORIES.iter().enumerate() {
            if index > 0 {
                session.pause().await;
            }
            log::info!("Chugoku category: {}", slug);
            let added = paginate(
                session,
                1..=MAX_PAGES_PER_CATEGORY,
                &mut seen,
                |page| self.page_url(slug, page),
                |html, url| parse_listing(html, url, *category),
            )
            .await?;
            log::info!("  {}: {} spots", slug, added);
        }
        Ok(())
    }
}
