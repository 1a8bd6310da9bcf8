// src/services/fetch.rs

//! HTTP page fetching and request pacing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;

/// Source of raw HTML pages.
///
/// Returns the body as text; callers parse it into a document synchronously
/// so no parsed tree is held across an await point.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET a page. A missing page is reported as [`AppError::NotFound`].
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &ScraperConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// `PageFetcher` backed by `reqwest`. No retries: a failed request is
/// returned to the caller as-is.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(url));
        }
        let text = response.error_for_status()?.text().await?;
        Ok(text)
    }
}

/// Fixed pause between requests. Purely advisory politeness toward the
/// scraped site; a zero delay disables it.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fetcher for scraper tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves canned pages; unknown URLs are 404s. Records every request.
    #[derive(Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, String>,
        failures: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn failing(mut self, url: &str, message: &str) -> Self {
            self.failures.insert(url.to_string(), message.to_string());
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch_html(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            if let Some(message) = self.failures.get(url) {
                return Err(AppError::scrape(url, message));
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::not_found(url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticFetcher;
    use super::*;

    #[test]
    fn test_create_client() {
        assert!(create_client(&ScraperConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter_disabled_returns_immediately() {
        let limiter = RateLimiter::disabled();
        assert!(limiter.delay().is_zero());
        limiter.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_sleeps_for_delay() {
        let limiter = RateLimiter::new(Duration::from_millis(2000));
        let start = tokio::time::Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_static_fetcher_reports_not_found() {
        let fetcher = StaticFetcher::new().page("https://a.test/", "<html></html>");
        assert!(fetcher.fetch_html("https://a.test/").await.is_ok());
        let err = fetcher.fetch_html("https://a.test/missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fetcher.requested().len(), 2);
    }
}
