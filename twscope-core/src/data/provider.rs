//! Data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources (Yahoo Finance,
//! synthetic random walks) so we can swap implementations and mock for tests.
//! Caching sits above this trait: providers don't know about the cache.

use thiserror::Error;

use crate::domain::{Fundamentals, Period, PriceSeries, SeriesError};

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI output as-is.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars returned for {symbol}")]
    EmptySeries { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// True when the source answered but had nothing for the symbol.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            DataError::SymbolNotFound { .. } | DataError::EmptySeries { .. }
        )
    }
}

/// Trait for market data providers.
///
/// Implementations make blocking calls; retry, timeout and rate-limit policy
/// belong to the implementation, never to the callers.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over a look-back period.
    ///
    /// An empty answer is reported as `DataError::EmptySeries`.
    fn fetch_series(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError>;

    /// Fetch fundamental fields. Never fails: missing fields stay `None`.
    fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_series(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError> {
        (**self).fetch_series(symbol, period)
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals {
        (**self).fetch_fundamentals(symbol)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_series(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError> {
        (**self).fetch_series(symbol, period)
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals {
        (**self).fetch_fundamentals(symbol)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
