// src/pipeline/cache_cleanup.rs

//! Remove `place_details` rows whose location no longer exists.

use std::collections::HashSet;

use crate::error::Result;
use crate::storage::LocationStore;
use crate::utils::console;

/// Rows deleted per request.
const DELETE_CHUNK: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub cached: usize,
    pub orphaned: Vec<String>,
    /// Zero on a dry run
    pub deleted: usize,
}

/// Location ids in `cached` that are absent from `locations`, in cache order.
pub fn orphaned_ids(cached: &[String], locations: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    cached
        .iter()
        .filter(|id| !locations.contains(*id))
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

pub async fn cleanup_place_details(store: &dyn LocationStore, dry_run: bool) -> Result<CleanupReport> {
    console::header(if dry_run {
        "Place details cleanup (dry run)"
    } else {
        "Place details cleanup"
    });

    let locations: HashSet<String> = store
        .load_identities()
        .await?
        .into_iter()
        .map(|identity| identity.id)
        .collect();
    let cached = store.place_detail_location_ids().await?;
    let orphaned = orphaned_ids(&cached, &locations);

    log::info!(
        "{} locations, {} cached place details, {} orphaned",
        locations.len(),
        cached.len(),
        orphaned.len()
    );
    for id in orphaned.iter().take(20) {
        console::sub_item(id);
    }
    if orphaned.len() > 20 {
        console::sub_item(&format!("... and {} more", orphaned.len() - 20));
    }

    let mut deleted = 0;
    if !dry_run {
        for chunk in orphaned.chunks(DELETE_CHUNK) {
            deleted += store.delete_place_details(chunk).await?;
        }
        console::success(&format!("Deleted {} orphaned place details", deleted));
    }

    Ok(CleanupReport {
        cached: cached.len(),
        orphaned,
        deleted,
    })
}
