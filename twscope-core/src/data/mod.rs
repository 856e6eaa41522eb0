//! Market data boundary: provider trait, Yahoo client, caching and fallbacks.

pub mod cache;
pub mod circuit_breaker;
pub mod listing;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use cache::{CachePolicy, CachedProvider, TtlCache};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use listing::{fetch_with_fallback, otc_alternative, resolve_symbol};
pub use provider::{DataError, MarketDataProvider};
pub use synthetic::SyntheticProvider;
pub use yahoo::{YahooOptions, YahooProvider};
