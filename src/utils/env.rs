//! Environment helpers: `.env.local` loading and ergonomic getters.

use std::sync::Once;

use crate::error::{AppError, Result};

static INIT: Once = Once::new();

/// Load `.env.local` then `.env` exactly once. Variables already set in the
/// process environment win.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::from_filename(".env.local").is_ok() {
            log::debug!("Loaded environment from .env.local");
        }
        let _ = dotenv::dotenv();
    });
}

/// Get required env var; error if missing or blank.
pub fn env_req(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| AppError::MissingEnv(key.to_string()))
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Interpret an env var as a boolean flag ("1", "true", "yes", "on").
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(v) => parse_flag(&v),
        None => default,
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_missing_required_env() {
        let err = env_req("KOKU_SCRAPER_SURELY_UNSET_VAR").unwrap_err();
        assert!(matches!(err, AppError::MissingEnv(ref k) if k == "KOKU_SCRAPER_SURELY_UNSET_VAR"));
    }
}
