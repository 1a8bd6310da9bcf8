// src/pipeline/seed.rs

//! Insert scraped locations into the `locations` table.
//!
//! Re-runnable: every candidate is checked against a fresh snapshot of the
//! table first, so a second run over the same file inserts nothing.

use std::collections::HashSet;
use std::slice;

use crate::error::Result;
use crate::models::{LocationRow, ScrapedLocation};
use crate::pipeline::dedup::{DedupCandidate, ExistingLocationCache};
use crate::storage::LocationStore;
use crate::utils::console;

/// Outcome counts of one seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Locations read from the input
    pub total: usize,
    pub inserted: usize,
    /// Already in the table (dedup cache hit or unique violation)
    pub duplicates: usize,
    /// Same generated id earlier in this input
    pub batch_duplicates: usize,
    /// Rows rejected for any other reason
    pub failed: usize,
}

/// Seed `locations` into the store in batches of `batch_size`.
///
/// A batch that hits a unique violation is retried one row at a time so
/// only the conflicting rows are skipped. Other insert errors are logged
/// and counted in [`SeedReport::failed`].
pub async fn seed_locations(
    store: &dyn LocationStore,
    locations: &[ScrapedLocation],
    batch_size: usize,
) -> Result<SeedReport> {
    let mut report = SeedReport {
        total: locations.len(),
        ..SeedReport::default()
    };

    let mut cache = ExistingLocationCache::load(store).await?;
    let mut ids = HashSet::new();
    let mut pending: Vec<LocationRow> = Vec::new();

    for location in locations {
        if let Some(reason) = cache.check(DedupCandidate::from(location)) {
            log::debug!("Skipping {}: {}", location.name, reason);
            report.duplicates += 1;
            continue;
        }
        let row = LocationRow::from(location);
        if !ids.insert(row.id.clone()) {
            log::debug!("Skipping {}: id {} repeated in input", location.name, row.id);
            report.batch_duplicates += 1;
            continue;
        }
        pending.push(row);
    }

    log::info!(
        "{} new, {} already in database, {} repeated ids",
        pending.len(),
        report.duplicates,
        report.batch_duplicates
    );

    let batch_size = batch_size.max(1);
    let batches = pending.len().div_ceil(batch_size);
    for (index, batch) in pending.chunks(batch_size).enumerate() {
        match store.insert_locations(batch).await {
            Ok(()) => {
                report.inserted += batch.len();
                log::info!("Batch {}/{}: inserted {}", index + 1, batches, batch.len());
            }
            Err(e) if e.is_unique_violation() => {
                log::warn!(
                    "Batch {}/{} hit a unique violation; inserting row by row",
                    index + 1,
                    batches
                );
                insert_one_by_one(store, batch, &mut report).await;
            }
            Err(e) => {
                log::error!("Batch {}/{} failed: {}", index + 1, batches, e);
                report.failed += batch.len();
                continue;
            }
        }
        for row in batch {
            cache.remember(DedupCandidate {
                place_id: row.place_id.as_deref(),
                source_url: Some(row.seed_source_url.as_str()),
                name: &row.name,
                region: &row.region,
            });
        }
    }

    console::summary(
        "Seed",
        &[
            ("Input", report.total.to_string()),
            ("Inserted", report.inserted.to_string()),
            ("Duplicates", report.duplicates.to_string()),
            ("Repeated ids", report.batch_duplicates.to_string()),
            ("Failed", report.failed.to_string()),
        ],
    );
    Ok(report)
}

async fn insert_one_by_one(store: &dyn LocationStore, batch: &[LocationRow], report: &mut SeedReport) {
    for row in batch {
        match store.insert_locations(slice::from_ref(row)).await {
            Ok(()) => report.inserted += 1,
            Err(e) if e.is_unique_violation() => {
                log::debug!("Duplicate id {} ({})", row.id, row.name);
                report.duplicates += 1;
            }
            Err(e) => {
                log::error!("Insert of {} failed: {}", row.id, e);
                report.failed += 1;
            }
        }
    }
}
