//! Rolling technical indicators.
//!
//! Indicators are pure functions: bar history in, numeric series out, same
//! length as the input. Values before a window is full are `f64::NAN`, and a
//! NaN anywhere inside a window makes that window's output NaN.
//!
//! Bollinger Bands are exposed as separate named instances per band, keeping
//! the single-series `Indicator` trait unchanged.

pub mod bollinger;
pub mod frame;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use frame::{IndicatorFrame, IndicatorRow};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are always NaN.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Trailing mean over `period` values; NaN until the window fills or while it holds a NaN.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().sum::<f64>() / period as f64
    })
}

/// Trailing sample standard deviation (divide by N-1) over `period` values.
///
/// A one-value window has no sample deviation and yields NaN.
pub(crate) fn rolling_sample_std(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        if period < 2 {
            return f64::NAN;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let ss: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (period - 1) as f64).sqrt()
    })
}

fn rolling(values: &[f64], period: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(window);
    }
    out
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
