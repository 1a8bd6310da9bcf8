//! Service layer shared by every scraper.
//!
//! This module contains:
//! - Page fetching and request pacing (`PageFetcher`, `HttpFetcher`, `RateLimiter`)
//! - The consecutive-miss `CircuitBreaker`
//! - String normalization (`normalize`)

mod circuit_breaker;
mod fetch;
pub mod normalize;

pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerConfig};
pub use fetch::{HttpFetcher, PageFetcher, RateLimiter, create_client};

#[cfg(test)]
pub(crate) use fetch::testing;
