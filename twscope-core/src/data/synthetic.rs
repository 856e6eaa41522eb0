//! Synthetic data provider for offline use and tests.
//!
//! Produces a deterministic random walk per symbol: the RNG is seeded from a
//! BLAKE3 hash of the symbol, so the same symbol and end date always yield the
//! same bars. Every period is a tail of the same underlying walk.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Bar, Fundamentals, Period, PriceSeries};

/// Deterministic random-walk provider. Weekends are skipped.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    end: NaiveDate,
    unlisted: HashSet<String>,
}

impl SyntheticProvider {
    /// Walk ending on `end` (inclusive).
    pub fn new(end: NaiveDate) -> Self {
        Self {
            end,
            unlisted: HashSet::new(),
        }
    }

    /// Walk ending today (local time).
    pub fn ending_today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    /// Answer `SymbolNotFound` for this symbol.
    pub fn without(mut self, symbol: impl Into<String>) -> Self {
        self.unlisted.insert(symbol.into());
        self
    }

    fn rng(symbol: &str, stream: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(stream.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    fn walk(&self, symbol: &str) -> Vec<Bar> {
        let mut rng = Self::rng(symbol, "bars");
        let mut price: f64 = rng.gen_range(20.0..1000.0);
        let mut current = self.end - Duration::days(Period::Max.calendar_days());
        let mut bars = Vec::new();

        while current <= self.end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += Duration::days(1);
        }

        bars
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_series(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError> {
        if self.unlisted.contains(symbol) {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let start = self.end - Duration::days(period.calendar_days());
        let bars: Vec<Bar> = self
            .walk(symbol)
            .into_iter()
            .filter(|b| b.date > start)
            .collect();

        if bars.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
            });
        }

        Ok(PriceSeries::new(symbol, bars)?.with_display_name(Some(format!("Synthetic {symbol}"))))
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals {
        if self.unlisted.contains(symbol) || symbol.starts_with('^') {
            return Fundamentals::default();
        }
        let mut rng = Self::rng(symbol, "fundamentals");
        Fundamentals {
            trailing_pe: Some(rng.gen_range(6.0..40.0)),
            return_on_equity: Some(rng.gen_range(-0.05..0.35)),
            long_name: Some(format!("Synthetic {symbol}")),
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}
