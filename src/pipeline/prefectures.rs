// src/pipeline/prefectures.rs

//! Prefecture spelling repair over the `locations` table.
//!
//! Distinct values are grouped by [`normalize_prefecture`]; every variant
//! that differs from its group's canonical form is rewritten with one
//! update per variant. Running it twice is a no-op.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::services::normalize::normalize_prefecture;
use crate::storage::LocationStore;
use crate::utils::console;

/// Rewrites needed for one canonical prefecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefectureGroup {
    pub canonical: String,
    /// Rows already spelled canonically
    pub canonical_rows: usize,
    /// Non-canonical spellings and their row counts
    pub variants: Vec<(String, usize)>,
}

impl PrefectureGroup {
    pub fn rows_to_update(&self) -> usize {
        self.variants.iter().map(|(_, count)| count).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub distinct_values: usize,
    pub groups: Vec<PrefectureGroup>,
    /// Rows rewritten; zero on a dry run
    pub rows_updated: usize,
}

/// Group distinct prefecture values by canonical form, keeping only the
/// groups that have at least one non-canonical variant.
pub fn plan(counts: &BTreeMap<String, usize>) -> Vec<PrefectureGroup> {
    let mut grouped: BTreeMap<String, PrefectureGroup> = BTreeMap::new();
    for (value, &count) in counts {
        let canonical = normalize_prefecture(value);
        if canonical.is_empty() {
            continue;
        }
        let group = grouped
            .entry(canonical.clone())
            .or_insert_with(|| PrefectureGroup {
                canonical: canonical.clone(),
                canonical_rows: 0,
                variants: Vec::new(),
            });
        if *value == canonical {
            group.canonical_rows += count;
        } else {
            group.variants.push((value.clone(), count));
        }
    }
    grouped
        .into_values()
        .filter(|group| !group.variants.is_empty())
        .collect()
}

/// Print the plan and, when `execute` is set, apply it.
pub async fn normalize_prefectures(
    store: &dyn LocationStore,
    execute: bool,
) -> Result<NormalizeReport> {
    console::header(if execute {
        "Normalize prefectures (EXECUTE)"
    } else {
        "Normalize prefectures (dry run)"
    });

    let counts = store.prefecture_counts().await?;
    let groups = plan(&counts);
    let mut report = NormalizeReport {
        distinct_values: counts.len(),
        ..NormalizeReport::default()
    };

    log::info!(
        "{} distinct prefecture values, {} need normalizing",
        counts.len(),
        groups.len()
    );
    for group in &groups {
        log::info!("{} ({} canonical rows)", group.canonical, group.canonical_rows);
        for (variant, count) in &group.variants {
            console::sub_item(&format!("\"{}\" → \"{}\" ({} rows)", variant, group.canonical, count));
        }
    }

    if execute {
        for group in &groups {
            for (variant, _) in &group.variants {
                let updated = store.rename_prefecture(variant, &group.canonical).await?;
                log::info!("Updated {} rows: \"{}\" → \"{}\"", updated, variant, group.canonical);
                report.rows_updated += updated;
            }
        }
        console::success(&format!("{} rows updated", report.rows_updated));
    } else if !groups.is_empty() {
        let pending: usize = groups.iter().map(PrefectureGroup::rows_to_update).sum();
        log::info!("Dry run: {} rows would change. Re-run with --execute to apply.", pending);
    }

    report.groups = groups;
    Ok(report)
}
