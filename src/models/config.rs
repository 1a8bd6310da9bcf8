//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and politeness settings shared by every scraper
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Where artifacts are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Nationwide spot-id scraper settings
    #[serde(default)]
    pub jnto: JntoConfig,

    /// Database seeding settings
    #[serde(default)]
    pub seed: SeedConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(AppError::validation("output.dir is empty"));
        }
        if self.jnto.max_spot_id == 0 || self.jnto.test_mode_max_spot_id == 0 {
            return Err(AppError::validation("jnto spot id range must be > 0"));
        }
        if self.jnto.consecutive_miss_limit == 0 {
            return Err(AppError::validation(
                "jnto.consecutive_miss_limit must be > 0",
            ));
        }
        url::Url::parse(&self.jnto.base_url)
            .map_err(|e| AppError::validation(format!("jnto.base_url: {e}")))?;
        if self.seed.batch_size == 0 {
            return Err(AppError::validation("seed.batch_size must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client and request pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests in milliseconds, unless a scraper overrides it
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl ScraperConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
        }
    }
}

/// Settings for the spot-id iteration scraper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JntoConfig {
    #[serde(default = "defaults::jnto_base_url")]
    pub base_url: String,

    /// Highest spot id to request
    #[serde(default = "defaults::max_spot_id")]
    pub max_spot_id: u32,

    /// Highest spot id when `TEST_MODE=true`
    #[serde(default = "defaults::test_mode_max_spot_id")]
    pub test_mode_max_spot_id: u32,

    /// Stop after this many missing pages in a row
    #[serde(default = "defaults::consecutive_miss_limit")]
    pub consecutive_miss_limit: usize,
}

impl JntoConfig {
    pub fn max_id(&self, test_mode: bool) -> u32 {
        if test_mode {
            self.test_mode_max_spot_id
        } else {
            self.max_spot_id
        }
    }
}

impl Default for JntoConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::jnto_base_url(),
            max_spot_id: defaults::max_spot_id(),
            test_mode_max_spot_id: defaults::test_mode_max_spot_id(),
            consecutive_miss_limit: defaults::consecutive_miss_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Rows per insert request
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Scraped JSON consumed by `seed-jnto`
    #[serde(default = "defaults::seed_input")]
    pub input: PathBuf,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::batch_size(),
            input: defaults::seed_input(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; KokuTravelBot/1.0; +https://kokutravel.com)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1500
    }

    pub fn output_dir() -> PathBuf {
        PathBuf::from("tmp")
    }

    pub fn jnto_base_url() -> String {
        "https://www.japan.travel".into()
    }
    pub fn max_spot_id() -> u32 {
        2366
    }
    pub fn test_mode_max_spot_id() -> u32 {
        20
    }
    pub fn consecutive_miss_limit() -> usize {
        50
    }

    pub fn batch_size() -> usize {
        100
    }
    pub fn seed_input() -> PathBuf {
        PathBuf::from("tmp/jnto-scraped.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.scraper.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let mut config = Config::default();
        config.seed.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scraper]
            request_delay_ms = 0

            [jnto]
            max_spot_id = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.scraper.request_delay_ms, 0);
        assert_eq!(config.scraper.timeout_secs, 30);
        assert_eq!(config.jnto.max_spot_id, 100);
        assert_eq!(config.jnto.consecutive_miss_limit, 50);
        assert_eq!(config.seed.batch_size, 100);
        assert_eq!(config.output.dir, PathBuf::from("tmp"));
    }

    #[test]
    fn jnto_test_mode_shrinks_range() {
        let jnto = JntoConfig::default();
        assert_eq!(jnto.max_id(false), 2366);
        assert_eq!(jnto.max_id(true), 20);
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.seed.batch_size, 100);
    }
}
