// src/pipeline/names.rs

//! Rewrite location names from a places-API enrichment file.
//!
//! The app's audience reads English, so the external display name is only
//! taken when it has no Japanese script in it.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::models::{Region, generate_location_id};
use crate::services::normalize::contains_japanese;
use crate::storage::{LocationStore, read_json_file};
use crate::utils::console;

/// Display name as returned by the places API: a plain string or a
/// localized `{ "text": ..., "languageCode": ... }` object.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DisplayName {
    Plain(String),
    Localized { text: String },
}

impl DisplayName {
    pub fn text(&self) -> &str {
        match self {
            DisplayName::Plain(text) | DisplayName::Localized { text } => text,
        }
    }
}

/// One entry of the enriched file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedLocation {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<DisplayName>,
}

impl EnrichedLocation {
    /// Stored id, or the deterministic id derived from name and region.
    pub fn location_id(&self) -> Option<String> {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }
        Region::from_text(&self.region).map(|region| generate_location_id(&self.name, region))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnrichedFile {
    Document { locations: Vec<EnrichedLocation> },
    Bare(Vec<EnrichedLocation>),
}

pub async fn load_enriched(path: impl AsRef<Path>) -> Result<Vec<EnrichedLocation>> {
    let file: EnrichedFile = read_json_file(path).await?;
    Ok(match file {
        EnrichedFile::Document { locations } => locations,
        EnrichedFile::Bare(locations) => locations,
    })
}

/// The external name unless it is blank or contains Japanese script.
pub fn choose_display_name<'a>(scraped: &'a str, display: Option<&'a str>) -> &'a str {
    match display.map(str::trim) {
        Some(name) if !name.is_empty() && !contains_japanese(name) => name,
        _ => scraped.trim(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameUpdateReport {
    pub total: usize,
    pub updated: usize,
    /// Entries whose external name was rejected for Japanese script
    pub kept_scraped: usize,
    /// No row with the entry's id
    pub missing: usize,
    /// Entries with neither an id nor a recognizable region
    pub skipped: usize,
    pub place_details_cleared: usize,
}

/// Apply the chosen names, then drop the `place_details` cache so it is
/// refetched under the new names.
pub async fn update_location_names(
    store: &dyn LocationStore,
    entries: &[EnrichedLocation],
) -> Result<NameUpdateReport> {
    console::header("Update location names");
    let mut report = NameUpdateReport {
        total: entries.len(),
        ..NameUpdateReport::default()
    };

    for entry in entries {
        let Some(id) = entry.location_id() else {
            log::warn!("Skipping {}: no id and unknown region {:?}", entry.name, entry.region);
            report.skipped += 1;
            continue;
        };

        let display = entry.display_name.as_ref().map(DisplayName::text);
        if display.is_some_and(contains_japanese) {
            report.kept_scraped += 1;
        }
        let name = choose_display_name(&entry.name, display);

        if store.update_location_name(&id, name).await? {
            log::debug!("{} → {}", id, name);
            report.updated += 1;
        } else {
            log::warn!("No location with id {}", id);
            report.missing += 1;
        }
    }

    report.place_details_cleared = store.clear_place_details().await?;

    console::summary(
        "Names",
        &[
            ("Entries", report.total.to_string()),
            ("Updated", report.updated.to_string()),
            ("Kept scraped name", report.kept_scraped.to_string()),
            ("Missing", report.missing.to_string()),
            ("Skipped", report.skipped.to_string()),
            ("Place details cleared", report.place_details_cleared.to_string()),
        ],
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, LocationRow, SEED_NOTE, ScrapedLocation};
    use crate::storage::MemoryStore;
    use chrono::Utc;

    fn row(name: &str, region: Region) -> LocationRow {
        LocationRow::from(&ScrapedLocation {
            name: name.to_string(),
            category: Category::Culture,
            region,
            prefecture: None,
            city: None,
            source: "test".to_string(),
            source_url: format!("https://x.test/{name}"),
            description: None,
            scraped_at: Utc::now(),
            note: SEED_NOTE.to_string(),
        })
    }

    #[test]
    fn test_choose_display_name() {
        assert_eq!(choose_display_name("Kinkaku-ji", Some("Kinkaku-ji Temple")), "Kinkaku-ji Temple");
        assert_eq!(choose_display_name("Kinkaku-ji", Some("金閣寺")), "Kinkaku-ji");
        assert_eq!(choose_display_name("Kinkaku-ji", Some("  ")), "Kinkaku-ji");
        assert_eq!(choose_display_name("Kinkaku-ji", None), "Kinkaku-ji");
    }

    #[test]
    fn test_entry_parsing_and_id_fallback() {
        let entries: Vec<EnrichedLocation> = serde_json::from_str(
            r#"[
                {"name": "Nara Park", "region": "Kansai", "displayName": {"text": "Nara Park", "languageCode": "en"}},
                {"id": "custom-id", "name": "Zenko-ji", "region": "?", "displayName": "Zenkoji Temple"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            entries[0].location_id(),
            Some(generate_location_id("Nara Park", Region::Kansai))
        );
        assert_eq!(entries[0].display_name.as_ref().map(DisplayName::text), Some("Nara Park"));
        assert_eq!(entries[1].location_id().as_deref(), Some("custom-id"));
    }

    #[tokio::test]
    async fn test_update_names_then_clear_cache() {
        let kinkaku = row("Kinkaku-ji", Region::Kansai);
        let nara = row("Nara Park", Region::Kansai);
        let store = MemoryStore::with_rows(vec![kinkaku.clone(), nara.clone()])
            .with_place_details(vec![kinkaku.id.clone(), nara.id.clone()]);

        let entries = vec![
            EnrichedLocation {
                id: None,
                name: "Kinkaku-ji".into(),
                region: "Kansai".into(),
                place_id: Some("ChIJ1".into()),
                display_name: Some(DisplayName::Plain("金閣寺".into())),
            },
            EnrichedLocation {
                id: Some(nara.id.clone()),
                name: "Nara Park".into(),
                region: "Kansai".into(),
                place_id: None,
                display_name: Some(DisplayName::Plain("Nara Deer Park".into())),
            },
            EnrichedLocation {
                id: None,
                name: "Gone".into(),
                region: "Kyushu".into(),
                place_id: None,
                display_name: None,
            },
        ];

        let report = update_location_names(&store, &entries).await.unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(report.kept_scraped, 1);
        assert_eq!(report.missing, 1);
        assert_eq!(report.place_details_cleared, 2);
        let names: Vec<String> = store.rows().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Kinkaku-ji", "Nara Deer Park"]);
        assert!(store.place_details().is_empty());
    }
}
