//! Pipeline entry points.
//!
//! - `run_scraper`: one site to `tmp/<name>-scraped.{json,ts}`
//! - `run_all`: every regional site (plus JNTO on request) into one artifact
//! - `seed_locations`: scraped JSON into the `locations` table
//! - `normalize_prefectures`, `update_location_names`, `cleanup_place_details`:
//!   data-repair passes over the database

pub mod cache_cleanup;
pub mod dedup;
pub mod names;
pub mod orchestrate;
pub mod prefectures;
pub mod scrape;
pub mod seed;

pub use cache_cleanup::{CleanupReport, cleanup_place_details};
pub use dedup::{DedupCandidate, DuplicateReason, ExistingLocationCache};
pub use names::{EnrichedLocation, NameUpdateReport, load_enriched, update_location_names};
pub use orchestrate::{ensure_all_succeeded, run_all};
pub use prefectures::{NormalizeReport, normalize_prefectures};
pub use scrape::run_scraper;
pub use seed::{SeedReport, seed_locations};
