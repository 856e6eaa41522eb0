//! PriceSeries: an ordered, duplicate-free run of bars for one symbol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;

/// Errors raised when assembling a series.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeriesError {
    #[error("bars out of order at index {index}: {date} does not follow {previous}")]
    OutOfOrder {
        index: usize,
        previous: chrono::NaiveDate,
        date: chrono::NaiveDate,
    },
}

/// Ordered bars for a single symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    display_name: Option<String>,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, rejecting duplicate or decreasing dates.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    index: i + 1,
                    previous: pair[0].date,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            display_name: None,
            bars,
        })
    }

    /// Attach the human-readable name reported by the data source.
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The most recent `n` bars (all of them if fewer exist).
    pub fn tail(&self, n: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Percent change between the last two closes.
    ///
    /// `None` with fewer than two bars, a non-positive reference close, or NaN closes.
    pub fn last_change_pct(&self) -> Option<f64> {
        let n = self.bars.len();
        if n < 2 {
            return None;
        }
        change_pct(self.bars[n - 2].close, self.bars[n - 1].close)
    }

    /// BLAKE3 hash over symbol, dates and OHLCV values.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for bar in &self.bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Percent change from `previous` to `current`.
pub fn change_pct(previous: f64, current: f64) -> Option<f64> {
    if previous.is_nan() || current.is_nan() || previous <= 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

/// Look-back window requested from the data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// Range token understood by the chart API.
    pub fn as_str(self) -> &'static str {
        match self {
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::Max => "max",
        }
    }

    /// Approximate number of calendar days covered.
    pub fn calendar_days(self) -> i64 {
        match self {
            Period::FiveDays => 7,
            Period::OneMonth => 31,
            Period::ThreeMonths => 92,
            Period::SixMonths => 183,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1826,
            Period::Max => 3652,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5d" => Ok(Period::FiveDays),
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "max" => Ok(Period::Max),
            other => Err(format!(
                "unknown period '{other}'. Valid: 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, max"
            )),
        }
    }
}
