//! Circuit Breaker for id-range iteration.
//!
//! Sites that expose detail pages by a dense numeric id have no reliable
//! "last id" lookup. The breaker counts consecutive missing pages and opens
//! once the streak reaches the configured limit, ending the iteration.

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive misses that open the breaker. Default: 50
    pub max_consecutive_misses: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_misses: 50,
        }
    }
}

/// State after recording an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Keep iterating
    Closed { consecutive_misses: usize },
    /// End of range reached
    Open { consecutive_misses: usize },
}

/// Consecutive-miss circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    consecutive_misses: usize,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default configuration.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            consecutive_misses: 0,
        }
    }

    pub fn with_limit(max_consecutive_misses: usize) -> Self {
        Self::with_config(CircuitBreakerConfig {
            max_consecutive_misses,
        })
    }

    /// A page was found; the streak resets.
    pub fn record_hit(&mut self) -> BreakerState {
        self.consecutive_misses = 0;
        self.state()
    }

    /// A page was missing or empty.
    pub fn record_miss(&mut self) -> BreakerState {
        self.consecutive_misses += 1;
        let state = self.state();
        if let BreakerState::Open { consecutive_misses } = state {
            log::info!(
                "Circuit breaker: OPEN after {} consecutive missing pages",
                consecutive_misses
            );
        }
        state
    }

    pub fn state(&self) -> BreakerState {
        if self.consecutive_misses >= self.config.max_consecutive_misses {
            BreakerState::Open {
                consecutive_misses: self.consecutive_misses,
            }
        } else {
            BreakerState::Closed {
                consecutive_misses: self.consecutive_misses,
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state(), BreakerState::Open { .. })
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
