//! Storage abstractions for scraped locations.
//!
//! Two kinds of persistence:
//! - Artifacts: `tmp/<scraper>-scraped.{json,ts}` written by every run
//! - The `locations` table (and its `place_details` cache) behind
//!   [`LocationStore`]
//!
//! ## Artifact Layout
//!
//! ```text
//! tmp/
//! ├── hokkaido-scraped.json        # metadata + locations + stats
//! ├── hokkaido-scraped.ts          # same data as typed constants
//! ├── ...
//! ├── all-scraped-locations.json   # combined across scrapers
//! └── all-scraped-locations.ts
//! ```

mod artifacts;
mod memory;
mod supabase;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{LocationIdentity, LocationRow};

pub use artifacts::{ArtifactWriter, COMBINED_ARTIFACT, load_scraped_locations, read_json_file};
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Backend holding the `locations` and `place_details` tables.
///
/// Every method is a single sequential round trip (or a paginated scan);
/// nothing spans a transaction.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Full scan of the identity columns used for deduplication.
    async fn load_identities(&self) -> Result<Vec<LocationIdentity>>;

    /// Insert a batch. A conflicting id fails the whole batch with
    /// [`AppError::UniqueViolation`](crate::error::AppError::UniqueViolation).
    async fn insert_locations(&self, rows: &[LocationRow]) -> Result<()>;

    /// Row count per distinct non-null `prefecture` value.
    async fn prefecture_counts(&self) -> Result<BTreeMap<String, usize>>;

    /// Rewrite every row whose prefecture equals `from`. Returns rows updated.
    async fn rename_prefecture(&self, from: &str, to: &str) -> Result<usize>;

    /// Set the display name of one location. Returns whether a row matched.
    async fn update_location_name(&self, id: &str, name: &str) -> Result<bool>;

    /// Every `location_id` present in `place_details`.
    async fn place_detail_location_ids(&self) -> Result<Vec<String>>;

    /// Delete `place_details` rows for the given location ids.
    async fn delete_place_details(&self, location_ids: &[String]) -> Result<usize>;

    /// Drop the whole `place_details` cache.
    async fn clear_place_details(&self) -> Result<usize>;
}
