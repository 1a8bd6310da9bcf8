//! In-memory `LocationStore` for tests and offline dry runs.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{LocationIdentity, LocationRow};
use crate::storage::LocationStore;

/// Mutex-held tables mirroring the columns the pipeline touches.
#[derive(Debug, Default)]
pub struct MemoryStore {
    locations: Mutex<Vec<LocationRow>>,
    place_details: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with existing rows.
    pub fn with_rows(rows: Vec<LocationRow>) -> Self {
        Self {
            locations: Mutex::new(rows),
            place_details: Mutex::new(Vec::new()),
        }
    }

    /// Seed the `place_details` cache with location ids.
    pub fn with_place_details(self, location_ids: Vec<String>) -> Self {
        *lock(&self.place_details) = location_ids;
        self
    }

    /// Snapshot of the `locations` table.
    pub fn rows(&self) -> Vec<LocationRow> {
        lock(&self.locations).clone()
    }

    /// Snapshot of the `place_details` cache keys.
    pub fn place_details(&self) -> Vec<String> {
        lock(&self.place_details).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn load_identities(&self) -> Result<Vec<LocationIdentity>> {
        Ok(lock(&self.locations).iter().map(LocationIdentity::from).collect())
    }

    async fn insert_locations(&self, rows: &[LocationRow]) -> Result<()> {
        let mut locations = lock(&self.locations);
        let mut ids: HashSet<&str> = locations.iter().map(|r| r.id.as_str()).collect();
        for row in rows {
            if !ids.insert(row.id.as_str()) {
                return Err(AppError::UniqueViolation(format!(
                    "duplicate key value violates unique constraint \"locations_pkey\" ({})",
                    row.id
                )));
            }
        }
        locations.extend_from_slice(rows);
        Ok(())
    }

    async fn prefecture_counts(&self) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for prefecture in lock(&self.locations).iter().filter_map(|r| r.prefecture.as_ref()) {
            *counts.entry(prefecture.clone()).or_default() += 1;
        }
        Ok(counts)
    }

    async fn rename_prefecture(&self, from: &str, to: &str) -> Result<usize> {
        let mut updated = 0;
        for row in lock(&self.locations).iter_mut() {
            if row.prefecture.as_deref() == Some(from) {
                row.prefecture = Some(to.to_string());
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn update_location_name(&self, id: &str, name: &str) -> Result<bool> {
        let mut locations = lock(&self.locations);
        match locations.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn place_detail_location_ids(&self) -> Result<Vec<String>> {
        Ok(self.place_details())
    }

    async fn delete_place_details(&self, location_ids: &[String]) -> Result<usize> {
        let doomed: HashSet<&String> = location_ids.iter().collect();
        let mut details = lock(&self.place_details);
        let before = details.len();
        details.retain(|id| !doomed.contains(id));
        Ok(before - details.len())
    }

    async fn clear_place_details(&self) -> Result<usize> {
        let mut details = lock(&self.place_details);
        let removed = details.len();
        details.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(id: &str, prefecture: Option<&str>) -> LocationRow {
        LocationRow {
            id: id.to_string(),
            name: id.to_string(),
            region: "Kansai".to_string(),
            city: None,
            category: "culture".to_string(),
            prefecture: prefecture.map(str::to_string),
            description: None,
            seed_source: "test".to_string(),
            seed_source_url: format!("https://example.com/{id}"),
            scraped_at: Utc::now(),
            place_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_existing_id() {
        let store = MemoryStore::with_rows(vec![row("a", None)]);
        let err = store
            .insert_locations(&[row("b", None), row("a", None)])
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        // batch is all-or-nothing
        assert_eq!(store.rows().len(), 1);

        store.insert_locations(&[row("b", None)]).await.unwrap();
        assert_eq!(store.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_prefecture() {
        let store = MemoryStore::with_rows(vec![
            row("a", Some("Kyoto-fu")),
            row("b", Some("Kyoto")),
            row("c", Some("Kyoto-fu")),
        ]);
        assert_eq!(store.rename_prefecture("Kyoto-fu", "Kyoto").await.unwrap(), 2);
        let counts = store.prefecture_counts().await.unwrap();
        assert_eq!(counts.get("Kyoto"), Some(&3));
        assert_eq!(counts.len(), 1);
    }

    #[tokio::test]
    async fn test_place_details_delete_and_clear() {
        let store = MemoryStore::new()
            .with_place_details(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(store.delete_place_details(&["b".into(), "z".into()]).await.unwrap(), 1);
        assert_eq!(store.place_details(), vec!["a".to_string(), "c".to_string()]);
        assert_eq!(store.clear_place_details().await.unwrap(), 2);
        assert!(store.place_details().is_empty());
    }
}
