// src/models/location.rs

//! Location records as scraped, stored, and read back for deduplication.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Marker stamped on every scraped record.
pub const SEED_NOTE: &str = "TEST DATA - scraped for internal testing, delete before launch";

/// Fixed category vocabulary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Culture,
    #[default]
    Attraction,
    Nature,
    Food,
    Shopping,
    Hotel,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Culture,
        Category::Attraction,
        Category::Nature,
        Category::Food,
        Category::Shopping,
        Category::Hotel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Culture => "culture",
            Category::Attraction => "attraction",
            Category::Nature => "nature",
            Category::Food => "food",
            Category::Shopping => "shopping",
            Category::Hotel => "hotel",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The nine top-level regions of Japan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Hokkaido,
    Tohoku,
    Kanto,
    Chubu,
    Kansai,
    Chugoku,
    Shikoku,
    Kyushu,
    Okinawa,
}

impl Region {
    pub const ALL: [Region; 9] = [
        Region::Hokkaido,
        Region::Tohoku,
        Region::Kanto,
        Region::Chubu,
        Region::Kansai,
        Region::Chugoku,
        Region::Shikoku,
        Region::Kyushu,
        Region::Okinawa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Hokkaido => "Hokkaido",
            Region::Tohoku => "Tohoku",
            Region::Kanto => "Kanto",
            Region::Chubu => "Chubu",
            Region::Kansai => "Kansai",
            Region::Chugoku => "Chugoku",
            Region::Shikoku => "Shikoku",
            Region::Kyushu => "Kyushu",
            Region::Okinawa => "Okinawa",
        }
    }

    /// Lowercase form used in URL path segments.
    pub fn slug(&self) -> String {
        self.as_str().to_lowercase()
    }

    /// Match a region by name, case-insensitively. Accepts common aliases
    /// such as "Kinki" and "Chubu/Central Japan".
    pub fn from_text(text: &str) -> Option<Region> {
        let lower = text.trim().to_lowercase();
        match lower.as_str() {
            "kinki" => return Some(Region::Kansai),
            "central japan" | "chubu/central japan" => return Some(Region::Chubu),
            _ => {}
        }
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(&lower))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record produced by a scraper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedLocation {
    pub name: String,
    pub category: Category,
    pub region: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub source: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scraped_at: DateTime<Utc>,
    #[serde(default = "default_note")]
    pub note: String,
}

fn default_note() -> String {
    SEED_NOTE.to_string()
}

impl ScrapedLocation {
    /// Deterministic database id for this record.
    pub fn location_id(&self) -> String {
        generate_location_id(&self.name, self.region)
    }
}

/// The partial record a scraper hands to the collector.
#[derive(Debug, Clone)]
pub struct LocationDraft {
    pub name: String,
    pub category: Category,
    pub region: Region,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub source_url: String,
    pub description: Option<String>,
}

impl LocationDraft {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        region: Region,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            region,
            prefecture: None,
            city: None,
            source_url: source_url.into(),
            description: None,
        }
    }

    pub fn prefecture(mut self, prefecture: Option<String>) -> Self {
        self.prefecture = prefecture;
        self
    }

    pub fn city(mut self, city: Option<String>) -> Self {
        self.city = city;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Row shape for the `locations` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationRow {
    pub id: String,
    pub name: String,
    pub region: String,
    pub city: Option<String>,
    pub category: String,
    pub prefecture: Option<String>,
    pub description: Option<String>,
    pub seed_source: String,
    pub seed_source_url: String,
    pub scraped_at: DateTime<Utc>,
    #[serde(default)]
    pub place_id: Option<String>,
}

impl From<&ScrapedLocation> for LocationRow {
    fn from(location: &ScrapedLocation) -> Self {
        Self {
            id: location.location_id(),
            name: location.name.clone(),
            region: location.region.to_string(),
            city: location.city.clone(),
            category: location.category.to_string(),
            prefecture: location.prefecture.clone(),
            description: location.description.clone(),
            seed_source: location.source.clone(),
            seed_source_url: location.source_url.clone(),
            scraped_at: location.scraped_at,
            place_id: None,
        }
    }
}

/// Identity columns read back from the `locations` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationIdentity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub seed_source_url: Option<String>,
}

impl From<&LocationRow> for LocationIdentity {
    fn from(row: &LocationRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            region: Some(row.region.clone()),
            place_id: row.place_id.clone(),
            seed_source_url: Some(row.seed_source_url.clone()),
        }
    }
}

/// Lowercase ASCII slug; runs of anything else collapse to one `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Deterministic id: `slug(name-region)` + `-` + first 8 hex chars of the
/// SHA-256 of the same `name-region` key.
///
/// Identity is a pure function of `(name, region)`; two venues sharing both
/// collide.
pub fn generate_location_id(name: &str, region: Region) -> String {
    let key = format!("{}-{}", name, region.as_str());
    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    let slug = slugify(&key);
    if slug.is_empty() {
        digest[..8].to_string()
    } else {
        format!("{}-{}", slug, &digest[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sapporo Clock Tower"), "sapporo-clock-tower");
        assert_eq!(slugify("  Kiyomizu-dera (Temple) "), "kiyomizu-dera-temple");
        assert_eq!(slugify("札幌"), "");
    }

    #[test]
    fn test_generate_location_id_is_deterministic() {
        let a = generate_location_id("Sapporo Clock Tower", Region::Hokkaido);
        let b = generate_location_id("Sapporo Clock Tower", Region::Hokkaido);
        assert_eq!(a, b);
        assert!(a.starts_with("sapporo-clock-tower-hokkaido-"));
        assert_eq!(a.len(), "sapporo-clock-tower-hokkaido-".len() + 8);
    }

    #[test]
    fn test_generate_location_id_differs_by_region_and_name() {
        let hokkaido = generate_location_id("Central Park", Region::Hokkaido);
        let kanto = generate_location_id("Central Park", Region::Kanto);
        let other = generate_location_id("Central Parks", Region::Hokkaido);
        assert_ne!(hokkaido, kanto);
        assert_ne!(hokkaido, other);
    }

    #[test]
    fn test_generate_location_id_for_japanese_name() {
        let id = generate_location_id("札幌時計台", Region::Hokkaido);
        assert!(id.starts_with("hokkaido-"));
        assert_ne!(id, generate_location_id("函館山", Region::Hokkaido));
    }

    #[test]
    fn test_region_from_text() {
        assert_eq!(Region::from_text("kyushu"), Some(Region::Kyushu));
        assert_eq!(Region::from_text(" Kinki "), Some(Region::Kansai));
        assert_eq!(Region::from_text("Atlantis"), None);
    }

    #[test]
    fn test_scraped_location_json_shape() {
        let location = ScrapedLocation {
            name: "Goryokaku".into(),
            category: Category::Culture,
            region: Region::Hokkaido,
            prefecture: Some("Hokkaido".into()),
            city: Some("Hakodate".into()),
            source: "visit-hokkaido.jp".into(),
            source_url: "https://www.visit-hokkaido.jp/en/spot/detail_1.html".into(),
            description: None,
            scraped_at: Utc::now(),
            note: SEED_NOTE.into(),
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["category"], "culture");
        assert_eq!(json["region"], "Hokkaido");
        assert!(json.get("sourceUrl").is_some());
        assert!(json.get("description").is_none());

        let row = LocationRow::from(&location);
        assert_eq!(row.id, location.location_id());
        assert_eq!(row.seed_source_url, location.source_url);
        assert_eq!(row.category, "culture");
    }
}
