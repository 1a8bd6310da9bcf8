// src/models/mod.rs

//! Domain models for the scraping and seeding pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod location;
mod stats;

// Re-export all public types
pub use config::{Config, JntoConfig, OutputConfig, ScraperConfig, SeedConfig};
pub use location::{
    Category, LocationDraft, LocationIdentity, LocationRow, Region, SEED_NOTE, ScrapedLocation,
    generate_location_id, slugify,
};
pub use stats::{
    CombinedOutput, CombinedStats, ScrapeMetadata, ScrapeOutput, ScraperStats, ScraperSummary,
};
