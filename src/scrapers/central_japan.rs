//! go-centraljapan.jp spot listing.
//!
//! Cards carry the name in an `<h3>` and the prefecture in the `<p>` right
//! after it. There are no category labels; the category comes from a
//! keyword scan over the name and teaser text.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::error::Result;
use crate::models::{LocationDraft, Region};
use crate::scrapers::{REGIONAL_DELAY, ScrapeSession, Scraper, paginate};
use crate::services::normalize::{normalize_category, normalize_prefecture, prefecture_in_text};
use crate::utils::html::{element_text, selector};
use crate::utils::resolve;

const BASE_URL: &str = "https://www.go-centraljapan.jp";

/// Keeps the run within 150-250 spots.
const MAX_PAGES: u32 = 12;

pub struct CentralJapanScraper {
    base_url: String,
}

impl CentralJapanScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/en/spots/?page={}", self.base_url, page)
    }
}

impl Default for CentralJapanScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// The first element sibling after the heading (or after the anchor that
/// wraps it), if it is a `<p>`.
fn next_paragraph<'a>(heading: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    let base = heading
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|parent| parent.value().name() == "a")
        .unwrap_or(*heading);
    base.next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|sibling| sibling.value().name() == "p")
}

/// Link for a heading: an anchor inside it, else the nearest enclosing one.
fn heading_link(heading: &ElementRef<'_>) -> Option<String> {
    let inner = heading
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "a");
    let outer = || {
        heading
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "a")
    };
    inner
        .or_else(outer)
        .and_then(|a| a.value().attr("href").map(str::to_string))
}

pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<LocationDraft>> {
    let document = Html::parse_document(html);
    let heading_sel = selector("h3")?;

    let mut drafts = Vec::new();
    for heading in document.select(&heading_sel) {
        let name = element_text(&heading);
        if name.is_empty() {
            continue;
        }

        let prefecture_text = next_paragraph(&heading).map(|p| element_text(&p));
        let prefecture = prefecture_text.as_deref().and_then(|text| {
            prefecture_in_text(text)
                .map(str::to_string)
                .or_else(|| Some(normalize_prefecture(text)).filter(|p| !p.is_empty()))
        });

        let url = heading_link(&heading)
            .and_then(|href| resolve(page_url, &href))
            .unwrap_or_else(|| page_url.to_string());

        drafts.push(
            LocationDraft::new(name.clone(), normalize_category(&name), Region::Chubu, url)
                .prefecture(prefecture),
        );
    }
    Ok(drafts)
}

#[async_trait]
impl Scraper for CentralJapanScraper {
    fn name(&self) -> &str {
        "central-japan"
    }

    fn source(&self) -> &str {
        "go-centraljapan.jp"
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
        log::info!("Central Japan: {} spots", added);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_parse_listing_reads_adjacent_paragraph() {
        let html = r#"
            <div class="spot">
              <a href="/en/spots/kenrokuen/"><h3>Kenroku-en Garden</h3></a>
              <p>Ishikawa</p>
            </div>
            <div class="spot">
              <h3><a href="/en/spots/matsumoto/">Matsumoto Castle</a></h3>
              <p>Nagano Prefecture</p>
            </div>
            <div class="spot">
              <h3>Shirakawa-go</h3>
              <div>Gifu</div>
            </div>"#;

        let drafts = parse_listing(html, "https://www.go-centraljapan.jp/en/spots/?page=1").unwrap();
        assert_eq!(drafts.len(), 3);

        assert_eq!(drafts[0].name, "Kenroku-en Garden");
        assert_eq!(drafts[0].category, Category::Nature);
        assert_eq!(drafts[0].prefecture.as_deref(), Some("Ishikawa"));
        assert_eq!(
            drafts[0].source_url,
            "https://www.go-centraljapan.jp/en/spots/kenrokuen/"
        );

        assert_eq!(drafts[1].category, Category::Culture);
        assert_eq!(drafts[1].prefecture.as_deref(), Some("Nagano"));
        assert_eq!(
            drafts[1].source_url,
            "https://www.go-centraljapan.jp/en/spots/matsumoto/"
        );

        // sibling is not a <p>: no prefecture, falls back to the page URL
        assert_eq!(drafts[2].prefecture, None);
        assert_eq!(drafts[2].category, Category::Attraction);
        assert_eq!(drafts[2].source_url, "https://www.go-centraljapan.jp/en/spots/?page=1");
    }
}
