//! visit-kyushu.com "see and do" listing.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::Result;
use crate::models::{LocationDraft, Region};
use crate::scrapers::{REGIONAL_DELAY, ScrapeSession, Scraper, paginate};
use crate::services::normalize::{
    clean_text, match_category, normalize_category, prefecture_in_text,
};
use crate::utils::html::{first_text, selector};
use crate::utils::resolve;

const BASE_URL: &str = "https://www.visit-kyushu.com";

const MAX_PAGES: u32 = 15;

pub struct KyushuScraper {
    base_url: String,
}

impl KyushuScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/en/see-and-do/?page={}", self.base_url, page)
    }
}

impl Default for KyushuScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// `"Beppu, Oita"` → city `Beppu`, prefecture `Oita`.
fn split_location(text: &str) -> (Option<String>, Option<String>) {
    let prefecture = prefecture_in_text(text).map(str::to_string);
    let first = text.split(',').map(clean_text).find(|p| !p.is_empty());
    let city = first.filter(|part| prefecture_in_text(part).is_none());
    (prefecture, city)
}

pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<LocationDraft>> {
    let document = Html::parse_document(html);
    let card_sel = selector("article.spot-card, .spot-card")?;
    let title_sel = selector(".spot-card__title, h3, h2")?;
    let location_sel = selector(".spot-card__location, .location")?;
    let desc_sel = selector(".spot-card__text, p")?;
    let link_sel = selector("a[href]")?;

    let mut drafts = Vec::new();
    for card in document.select(&card_sel) {
        let name = first_text(&card, &title_sel).unwrap_or_default();
        let url = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(page_url, href))
            .unwrap_or_else(|| page_url.to_string());

        let description = first_text(&card, &desc_sel);
        let category = card
            .value()
            .attr("data-category")
            .and_then(match_category)
            .unwrap_or_else(|| {
                normalize_category(&format!(
                    "{} {}",
                    name,
                    description.as_deref().unwrap_or_default()
                ))
            });

        let (prefecture, city) = first_text(&card, &location_sel)
            .map(|text| split_location(&text))
            .unwrap_or_default();

        drafts.push(
            LocationDraft::new(name, category, Region::Kyushu, url)
                .prefecture(prefecture)
                .city(city)
                .description(description),
        );
    }
    Ok(drafts)
}

#[async_trait]
impl Scraper for KyushuScraper {
    fn name(&self) -> &str {
        "kyushu"
    }

    fn source(&self) -> &str {
        "visit-kyushu.com"
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
        log::info!("Kyushu: {} spots", added);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_split_location() {
        assert_eq!(
            split_location("Beppu, Oita"),
            (Some("Oita".into()), Some("Beppu".into()))
        );
        assert_eq!(split_location("Kumamoto"), (Some("Kumamoto".into()), None));
        assert_eq!(split_location(""), (None, None));
    }

    #[test]
    fn test_parse_listing() {
        let html = r#"
            <article class="spot-card" data-category="Onsen">
              <a href="/en/see-and-do/jigoku-meguri"><h3 class="spot-card__title">Beppu Hells</h3></a>
              <span class="spot-card__location">Beppu, Oita</span>
            </article>
            <article class="spot-card" data-category="">
              <a href="/en/see-and-do/dazaifu"><h3 class="spot-card__title">Dazaifu Tenmangu Shrine</h3></a>
              <span class="spot-card__location">Dazaifu, Fukuoka</span>
              <p class="spot-card__text">Shrine of learning.</p>
            </article>"#;

        let drafts = parse_listing(html, "https://www.visit-kyushu.com/en/see-and-do/?page=1").unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].category, Category::Nature);
        assert_eq!(drafts[0].prefecture.as_deref(), Some("Oita"));
        assert_eq!(drafts[0].city.as_deref(), Some("Beppu"));
        assert_eq!(
            drafts[0].source_url,
            "https://www.visit-kyushu.com/en/see-and-do/jigoku-meguri"
        );
        assert_eq!(drafts[1].category, Category::Culture);
        assert_eq!(drafts[1].description.as_deref(), Some("Shrine of learning."));
    }

    #[test]
    fn test_category_falls_back_to_description() {
        let html = r#"
            <article class="spot-card">
              <a href="/en/see-and-do/takachiho"><h3 class="spot-card__title">Takachiho</h3></a>
              <p class="spot-card__text">Boat rides through a basalt gorge.</p>
            </article>
            <article class="spot-card"><p class="spot-card__text">Untitled card.</p></article>"#;
        let drafts = parse_listing(html, "https://www.visit-kyushu.com/en/see-and-do/").unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].category, Category::Nature);
        assert_eq!(drafts[1].name, "");
    }
}
