//! Cross-run duplicate detection against rows already in the database.
//!
//! The cache is a one-shot snapshot of the `locations` identity columns,
//! built once per run and used only as a lookup oracle.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::Result;
use crate::models::{LocationIdentity, ScrapedLocation};
use crate::services::normalize::normalize_name;
use crate::storage::LocationStore;

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateReason {
    PlaceId(String),
    SourceUrl(String),
    NameRegion { name: String, region: String },
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateReason::PlaceId(id) => write!(f, "place_id {id} already exists"),
            DuplicateReason::SourceUrl(url) => write!(f, "source URL {url} already exists"),
            DuplicateReason::NameRegion { name, region } => {
                write!(f, "name \"{name}\" already exists in {region}")
            }
        }
    }
}

/// Identity fields of a location being considered for insertion.
#[derive(Debug, Clone, Copy)]
pub struct DedupCandidate<'a> {
    pub place_id: Option<&'a str>,
    pub source_url: Option<&'a str>,
    pub name: &'a str,
    pub region: &'a str,
}

impl<'a> From<&'a ScrapedLocation> for DedupCandidate<'a> {
    fn from(location: &'a ScrapedLocation) -> Self {
        Self {
            place_id: None,
            source_url: Some(location.source_url.as_str()),
            name: &location.name,
            region: location.region.as_str(),
        }
    }
}

/// In-memory snapshot of existing location identities.
#[derive(Debug, Clone, Default)]
pub struct ExistingLocationCache {
    place_ids: HashSet<String>,
    source_urls: HashSet<String>,
    /// normalized name → lowercase regions
    names: HashMap<String, HashSet<String>>,
    rows: usize,
}

impl ExistingLocationCache {
    pub fn from_identities<'a>(identities: impl IntoIterator<Item = &'a LocationIdentity>) -> Self {
        let mut cache = Self::default();
        for identity in identities {
            cache.rows += 1;
            cache.remember(DedupCandidate {
                place_id: identity.place_id.as_deref(),
                source_url: identity.seed_source_url.as_deref(),
                name: &identity.name,
                region: identity.region.as_deref().unwrap_or_default(),
            });
        }
        cache
    }

    /// Full table scan of the identity columns.
    pub async fn load(store: &dyn LocationStore) -> Result<Self> {
        let identities = store.load_identities().await?;
        let cache = Self::from_identities(&identities);
        log::info!(
            "Dedup cache: {} rows, {} place ids, {} source URLs, {} names",
            cache.rows,
            cache.place_ids.len(),
            cache.source_urls.len(),
            cache.names.len()
        );
        Ok(cache)
    }

    /// Checks place id, then source URL, then normalized name + region.
    /// The first match decides the reason.
    pub fn check(&self, candidate: DedupCandidate<'_>) -> Option<DuplicateReason> {
        if let Some(place_id) = candidate.place_id.filter(|p| !p.is_empty()) {
            if self.place_ids.contains(place_id) {
                return Some(DuplicateReason::PlaceId(place_id.to_string()));
            }
        }

        if let Some(url) = candidate.source_url.filter(|u| !u.is_empty()) {
            if self.source_urls.contains(url) {
                return Some(DuplicateReason::SourceUrl(url.to_string()));
            }
        }

        let key = normalize_name(candidate.name);
        let region = candidate.region.to_lowercase();
        if !key.is_empty()
            && self
                .names
                .get(&key)
                .is_some_and(|regions| regions.contains(&region))
        {
            return Some(DuplicateReason::NameRegion {
                name: candidate.name.to_string(),
                region: candidate.region.to_string(),
            });
        }

        None
    }

    /// Add a candidate's identity to the snapshot.
    pub fn remember(&mut self, candidate: DedupCandidate<'_>) {
        if let Some(place_id) = candidate.place_id.filter(|p| !p.is_empty()) {
            self.place_ids.insert(place_id.to_string());
        }
        if let Some(url) = candidate.source_url.filter(|u| !u.is_empty()) {
            self.source_urls.insert(url.to_string());
        }
        let key = normalize_name(candidate.name);
        if !key.is_empty() {
            self.names
                .entry(key)
                .or_default()
                .insert(candidate.region.to_lowercase());
        }
    }

    /// Rows the snapshot was built from.
    pub fn row_count(&self) -> usize {
        self.rows
    }
}
