//! visit-hokkaido.jp spot listing.
//!
//! Listing pages link to spot details as `detail_<id>.html`. The same detail
//! is often linked twice per card (image and title), so an anchor without
//! text only counts when no other anchor names that detail.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::Result;
use crate::models::{Category, LocationDraft, Region};
use crate::scrapers::{REGIONAL_DELAY, ScrapeSession, Scraper, paginate};
use crate::services::normalize::{match_category, normalize_category};
use crate::utils::html::{element_text, first_text, selector};
use crate::utils::resolve;

const BASE_URL: &str = "https://www.visit-hokkaido.jp";

/// Roughly 20 spots per page; the listing tops out around page 15.
const MAX_PAGES: u32 = 15;

pub struct HokkaidoScraper {
    base_url: String,
}

impl HokkaidoScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/en/spot/?page={}", self.base_url, page)
    }
}

impl Default for HokkaidoScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract spot cards from one listing page.
pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<LocationDraft>> {
    let document = Html::parse_document(html);
    let link_sel = selector(r#"a[href^="detail_"], a[href*="/spot/detail_"]"#)?;
    let name_sel = selector(".spot-name, .title, h3, h2")?;
    let area_sel = selector(".spot-area, .area")?;
    let category_sel = selector(".spot-category, .category, .tag")?;
    let desc_sel = selector(".spot-text, p")?;

    let mut seen = HashSet::new();
    let mut unnamed = Vec::new();
    let mut drafts = Vec::new();

    for anchor in document.select(&link_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve(page_url, href) else {
            continue;
        };

        let name = first_text(&anchor, &name_sel).unwrap_or_else(|| element_text(&anchor));
        if name.is_empty() {
            unnamed.push(url);
            continue;
        }
        if !seen.insert(url.clone()) {
            continue;
        }

        let description = first_text(&anchor, &desc_sel);
        let category = first_text(&anchor, &category_sel)
            .and_then(|c| match_category(&c))
            .unwrap_or_else(|| {
                normalize_category(&format!(
                    "{} {}",
                    name,
                    description.as_deref().unwrap_or_default()
                ))
            });

        drafts.push(
            LocationDraft::new(name, category, Region::Hokkaido, url)
                .prefecture(Some("Hokkaido".to_string()))
                .city(first_text(&anchor, &area_sel))
                .description(description),
        );
    }

    // a detail only ever linked without text is a card we could not read
    for url in unnamed {
        if seen.insert(url.clone()) {
            drafts.push(LocationDraft::new("", Category::Attraction, Region::Hokkaido, url));
        }
    }

    Ok(drafts)
}

#[async_trait]
impl Scraper for HokkaidoScraper {
    fn name(&self) -> &str {
        "hokkaido"
    }

    fn source(&self) -> &str {
        "visit-hokkaido.jp"
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
        log::info!("Hokkaido: {} spots from listing", added);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RateLimiter;
    use crate::services::testing::StaticFetcher;

    const PAGE_1: &str = r#"
        <ul class="spot-list">
          <li>
            <a href="detail_101.html"><img src="a.jpg"></a>
            <a href="detail_101.html">
              <span class="spot-category">Onsen</span>
              <h3>Noboribetsu Hell Valley</h3>
              <span class="spot-area">Noboribetsu</span>
            </a>
          </li>
          <li>
            <a href="detail_102.html">
              <h3>Goryokaku Tower</h3>
              <span class="spot-area">Hakodate</span>
              <p>Star-shaped fort   views.</p>
            </a>
          </li>
          <li><a href="/en/other/">Not a spot</a></li>
        </ul>"#;

    #[test]
    fn test_parse_listing() {
        let drafts = parse_listing(PAGE_1, "https://www.visit-hokkaido.jp/en/spot/?page=1").unwrap();
        assert_eq!(drafts.len(), 2);

        assert_eq!(drafts[0].name, "Noboribetsu Hell Valley");
        assert_eq!(drafts[0].category, Category::Nature);
        assert_eq!(drafts[0].city.as_deref(), Some("Noboribetsu"));
        assert_eq!(
            drafts[0].source_url,
            "https://www.visit-hokkaido.jp/en/spot/detail_101.html"
        );

        // no category label: inferred from the name
        assert_eq!(drafts[1].category, Category::Attraction);
        assert_eq!(drafts[1].description.as_deref(), Some("Star-shaped fort views."));
        assert_eq!(drafts[1].prefecture.as_deref(), Some("Hokkaido"));
    }

    #[test]
    fn test_category_falls_back_to_description() {
        let html = r#"
            <a href="detail_201.html">
              <h3>Sounkyo</h3>
              <p class="spot-text">A gorge lined with basalt cliffs.</p>
            </a>"#;
        let drafts = parse_listing(html, "https://www.visit-hokkaido.jp/en/spot/").unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].category, Category::Nature);
    }

    #[tokio::test]
    async fn test_unreadable_card_counts_as_failure() {
        let fetcher = StaticFetcher::new().page(
            "https://hk.test/en/spot/?page=1",
            r#"
            <a href="detail_301.html"><img src="x.jpg"></a>
            <a href="detail_302.html"><img src="y.jpg"></a>
            <a href="detail_302.html"><h3>Lake Toya</h3></a>"#,
        );
        let scraper = HokkaidoScraper::with_base_url("https://hk.test");
        let mut session = ScrapeSession::new(&fetcher, RateLimiter::disabled(), scraper.source());

        scraper.scrape(&mut session).await.unwrap();

        let names: Vec<&str> = session.locations().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Lake Toya"]);
        assert_eq!(session.stats().failed_scrapes, 1);
    }

    #[tokio::test]
    async fn test_scrape_walks_pages() {
        let fetcher = StaticFetcher::new()
            .page("https://hk.test/en/spot/?page=1", PAGE_1)
            .page(
                "https://hk.test/en/spot/?page=2",
                r#"<a href="detail_103.html"><h3>Otaru Canal</h3></a>"#,
            );
        let scraper = HokkaidoScraper::with_base_url("https://hk.test");
        let mut session = ScrapeSession::new(&fetcher, RateLimiter::disabled(), scraper.source());

        scraper.scrape(&mut session).await.unwrap();

        let names: Vec<&str> = session.locations().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Noboribetsu Hell Valley", "Goryokaku Tower", "Otaru Canal"]);
        assert!(session.locations().iter().all(|l| l.region == Region::Hokkaido));
        assert_eq!(session.stats().successful_scrapes, 2);
    }
}
