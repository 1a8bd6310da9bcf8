//! the-kansai-guide.com directory (`/page/N/` pagination).
//!
//! Each entry has a meta line like `"Kyoto | Temples & Shrines"`: the
//! prefecture before the bar and the site's own category after it.

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

const BASE_URL: &str = "https://www.the-kansai-guide.com";

/// 15 pages of 12 entries.
const MAX_PAGES: u32 = 15;

pub struct KansaiScraper {
    base_url: String,
}

impl KansaiScraper {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/en/directory/", self.base_url)
        } else {
            format!("{}/en/directory/page/{}/", self.base_url, page)
        }
    }
}

impl Default for KansaiScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// `"Kyoto | Temples & Shrines"` → (prefecture, category label).
fn split_meta(meta: &str) -> (Option<String>, Option<String>) {
    let mut parts = meta.splitn(2, '|').map(clean_text);
    let prefecture = parts.next().filter(|p| !p.is_empty()).map(|p| {
        prefecture_in_text(&p)
            .map(str::to_string)
            .unwrap_or_else(|| normalize_prefecture(&p))
    });
    let label = parts.next().filter(|l| !l.is_empty());
    (prefecture, label)
}

pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<LocationDraft>> {
    let document = Html::parse_document(html);
    let item_sel = selector(".directory-item")?;
    let title_sel = selector(".directory-item__title a, .directory-item__title")?;
    let link_sel = selector(".directory-item__title a[href], a[href]")?;
    let meta_sel = selector(".directory-item__meta")?;
    let excerpt_sel = selector(".directory-item__excerpt")?;

    let mut drafts = Vec::new();
    for item in document.select(&item_sel) {
        let name = first_text(&item, &title_sel).unwrap_or_default();
        let url = item
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(page_url, href))
            .unwrap_or_else(|| page_url.to_string());

        let (prefecture, label) = first_text(&item, &meta_sel)
            .map(|meta| split_meta(&meta))
            .unwrap_or_default();
        let description = first_text(&item, &excerpt_sel);
        let category = label
            .as_deref()
            .and_then(match_category)
            .unwrap_or_else(|| {
                normalize_category(&format!(
                    "{} {}",
                    name,
                    description.as_deref().unwrap_or_default()
                ))
            });

        drafts.push(
            LocationDraft::new(name, category, Region::Kansai, url)
                .prefecture(prefecture)
                .description(description),
        );
    }
    Ok(drafts)
}

#[async_trait]
impl Scraper for KansaiScraper {
    fn name(&self) -> &str {
        "kansai"
    }

    fn source(&self) -> &str {
        "the-kansai-guide.com"
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
        log::info!("Kansai: {} directory entries", added);
        Ok(())
    }
}
