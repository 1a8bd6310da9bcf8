//! Local artifact files under the output directory.
//!
//! Each run leaves a JSON document and a TypeScript module with the same
//! data embedded as typed constants. Writes go to a temp file first and are
//! renamed into place.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CombinedOutput, SEED_NOTE, ScrapeOutput, ScrapedLocation};

/// File stem of the orchestrator's merged output.
pub const COMBINED_ARTIFACT: &str = "all-scraped-locations";

/// Writer rooted at the output directory (`tmp/` by default).
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// `<name>-scraped.json` and `<name>-scraped.ts`. Returns the JSON path.
    pub async fn write_scrape_output(&self, name: &str, output: &ScrapeOutput) -> Result<PathBuf> {
        let stem = format!("{name}-scraped");
        let json_path = self.write_json(&format!("{stem}.json"), output).await?;

        let ts = render_typescript(name, &output.locations, &output.stats)?;
        let ts_path = self.write_bytes(&format!("{stem}.ts"), ts.as_bytes()).await?;

        log::info!(
            "Saved {} locations to {} and {}",
            output.locations.len(),
            json_path.display(),
            ts_path.display()
        );
        Ok(json_path)
    }

    /// `all-scraped-locations.{json,ts}`. Returns the JSON path.
    pub async fn write_combined(&self, output: &CombinedOutput) -> Result<PathBuf> {
        let json_path = self
            .write_json(&format!("{COMBINED_ARTIFACT}.json"), output)
            .await?;

        let ts = render_typescript("all", &output.locations, &output.stats)?;
        self.write_bytes(&format!("{COMBINED_ARTIFACT}.ts"), ts.as_bytes())
            .await?;

        log::info!(
            "Saved {} combined locations to {}",
            output.locations.len(),
            json_path.display()
        );
        Ok(json_path)
    }
}

/// `hokkaido` → `HOKKAIDO`, `central-japan` → `CENTRAL_JAPAN`.
fn const_prefix(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// TypeScript module exposing the locations and stats as constants.
pub fn render_typescript<S: Serialize>(
    name: &str,
    locations: &[ScrapedLocation],
    stats: &S,
) -> Result<String> {
    let prefix = const_prefix(name);
    let locations_json = serde_json::to_string_pretty(locations)?;
    let stats_json = serde_json::to_string_pretty(stats)?;

    Ok(format!(
        "// Auto-generated by koku-scraper. Do not edit.\n\
         // {SEED_NOTE}\n\
         \n\
         export interface ScrapedLocation {{\n\
         \x20 name: string;\n\
         \x20 category: \"culture\" | \"attraction\" | \"nature\" | \"food\" | \"shopping\" | \"hotel\";\n\
         \x20 region: string;\n\
         \x20 prefecture?: string;\n\
         \x20 city?: string;\n\
         \x20 source: string;\n\
         \x20 sourceUrl: string;\n\
         \x20 description?: string;\n\
         \x20 scrapedAt: string;\n\
         \x20 note: string;\n\
         }}\n\
         \n\
         export const {prefix}_LOCATIONS: ScrapedLocation[] = {locations_json};\n\
         \n\
         export const {prefix}_STATS = {stats_json} as const;\n"
    ))
}

/// Scraped JSON as written by a run: the full document or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScrapedFile {
    Document { locations: Vec<ScrapedLocation> },
    Bare(Vec<ScrapedLocation>),
}

/// Read and parse a JSON input file. A missing file is a configuration
/// error rather than I/O.
pub async fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::config(format!(
                "Input file not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(AppError::Io(e)),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read locations back from a `*-scraped.json` artifact.
pub async fn load_scraped_locations(path: impl AsRef<Path>) -> Result<Vec<ScrapedLocation>> {
    let file: ScrapedFile = read_json_file(path).await?;
    Ok(match file {
        ScrapedFile::Document { locations } => locations,
        ScrapedFile::Bare(locations) => locations,
    })
}
