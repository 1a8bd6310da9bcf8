//! tohokukanko.jp attraction listing (path-segment pagination, `/page:N`).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::Result;
use crate::models::{LocationDraft, Region};
use crate::scrapers::{REGIONAL_DELAY, ScrapeSession, Scraper, paginate};
use crate::services::normalize::{
    clean_text, match_category, normalize_category, normalize_prefecture, prefecture_in_text,
};
use crate::utils::html::{first_text, selector};
use crate::utils::resolve;

const BASE_URL: &str = "https://www.tohokukanko.jp";

const MAX_PAGES: u32 = 12;

pub struct TohokuScraper {
    base_url: String,
}

impl TohokuScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/en/attractions/index/page:{}", self.base_url, page)
    }
}

impl Default for TohokuScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an area label such as `"Aomori / Hirosaki"` or `"Hirosaki, Aomori"`
/// into (prefecture, city).
fn split_area(area: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<String> = area
        .split(['/', ',', '|'])
        .map(clean_text)
        .filter(|p| !p.is_empty())
        .collect();

    let prefecture = prefecture_in_text(area).map(str::to_string);
    let city = parts
        .iter()
        .find(|part| prefecture.as_deref() != Some(normalize_prefecture(part).as_str()))
        .cloned();
    (prefecture, city)
}

pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<LocationDraft>> {
    let document = Html::parse_document(html);
    let card_sel = selector(".attraction-card, li.spot-item, .card")?;
    let link_sel = selector("a[href]")?;
    let name_sel = selector("h3, .name, .title")?;
    let area_sel = selector(".area, .location")?;
    let tag_sel = selector(".tag, .category")?;
    let desc_sel = selector("p.desc, .description, p")?;

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

        let description = first_text(&card, &desc_sel);
        let category = first_text(&card, &tag_sel)
            .and_then(|tag| match_category(&tag))
            .unwrap_or_else(|| {
                normalize_category(&format!(
                    "{} {}",
                    name,
                    description.as_deref().unwrap_or_default()
                ))
            });

        drafts.push(
            LocationDraft::new(name, category, Region::Tohoku, url)
                .prefecture(prefecture)
                .city(city)
                .description(description),
        );
    }
    Ok(drafts)
}

#[async_trait]
impl Scraper for TohokuScraper {
    fn name(&self) -> &str {
        "tohoku"
    }

    fn source(&self) -> &str {
        "tohokukanko.jp"
    }

    fn delay_override(&self) -> Option<Duration> {
        Some(REGIONAL_DELAY)
    }

    async fn scrape(&self, session: &mut ScrapeSession<'_>) -> Result<()> {
        let mut seen = HashSet::new();
        let added = paginate(
            session,
            1..=MAX_PAGES,
            &mut seen,
            |page| self.page_url(page),
            parse_listing,
        )
        .await?;
        log::info!("Tohoku: {} attractions", added);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_split_area() {
        assert_eq!(
            split_area("Aomori / Hirosaki"),
            (Some("Aomori".into()), Some("Hirosaki".into()))
        );
        assert_eq!(
            split_area("Matsushima, Miyagi Prefecture"),
            (Some("Miyagi".into()), Some("Matsushima".into()))
        );
        assert_eq!(split_area("Akita"), (Some("Akita".into()), None));
        assert_eq!(split_area("Somewhere"), (None, Some("Somewhere".into())));
    }

    #[test]
    fn test_parse_listing() {
        let html = r#"
            <div class="attraction-card">
              <a href="/en/attractions/detail_1031.html"><h3>Hirosaki Castle</h3></a>
              <span class="area">Aomori / Hirosaki</span>
              <span class="tag">History</span>
            </div>
            <div class="attraction-card">
              <a href="/en/attractions/detail_2044.html"><h3>Lake Tazawa</h3></a>
              <span class="area">Akita</span>
              <p class="desc">Japan's deepest lake.</p>
            </div>
            <div class="attraction-card"><span class="area">Iwate</span></div>"#;

        let drafts = parse_listing(html, "https://www.tohokukanko.jp/en/attractions/index/page:1").unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].category, Category::Culture);
        assert_eq!(drafts[0].prefecture.as_deref(), Some("Aomori"));
        assert_eq!(drafts[0].city.as_deref(), Some("Hirosaki"));
        assert_eq!(
            drafts[0].source_url,
            "https://www.tohokukanko.jp/en/attractions/detail_1031.html"
        );
        assert_eq!(drafts[1].category, Category::Nature);
        assert_eq!(drafts[1].city, None);
        assert_eq!(drafts[1].description.as_deref(), Some("Japan's deepest lake."));
        // left for the session to count as a failed item
        assert_eq!(drafts[2].name, "");
    }

    #[test]
    fn test_category_falls_back_to_description() {
        let html = r#"
            <div class="attraction-card">
              <a href="/en/attractions/detail_3001.html"><h3>Oirase</h3></a>
              <p class="desc">A mountain stream gorge.</p>
            </div>"#;
        let drafts = parse_listing(html, "https://www.tohokukanko.jp/en/attractions/").unwrap();
        assert_eq!(drafts[0].category, Category::Nature);
    }
}
