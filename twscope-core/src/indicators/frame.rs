//! IndicatorFrame: a price series with its dashboard indicators attached.
//!
//! Built once per fetch and never mutated; re-deriving means building a new frame.

use chrono::NaiveDate;
use serde::Serialize;

use super::{Bollinger, Indicator, Rsi, Sma};
use crate::domain::{Bar, PriceSeries};

pub const MA_SHORT_PERIOD: usize = 20;
pub const MA_LONG_PERIOD: usize = 60;
pub const RSI_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;

/// Bars needed before every indicator column is defined.
pub const FULL_HISTORY_BARS: usize = MA_LONG_PERIOD;

/// Series plus MA20, MA60, RSI14 and Bollinger(20, 2) columns, aligned by index.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    series: PriceSeries,
    ma20: Vec<f64>,
    ma60: Vec<f64>,
    rsi14: Vec<f64>,
    bb_mid: Vec<f64>,
    bb_upper: Vec<f64>,
    bb_lower: Vec<f64>,
}

/// One bar of the frame with undefined indicator values as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub rsi14: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl IndicatorFrame {
    pub fn compute(series: PriceSeries) -> Self {
        let bars = series.bars();
        let ma20 = Sma::new(MA_SHORT_PERIOD).compute(bars);
        let ma60 = Sma::new(MA_LONG_PERIOD).compute(bars);
        let rsi14 = Rsi::new(RSI_PERIOD).compute(bars);
        let bb_mid = Bollinger::middle(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).compute(bars);
        let bb_upper = Bollinger::upper(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).compute(bars);
        let bb_lower = Bollinger::lower(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).compute(bars);

        Self {
            series,
            ma20,
            ma60,
            rsi14,
            bb_mid,
            bb_upper,
            bb_lower,
        }
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// True once the longest window (MA60) is available on the last bar.
    pub fn has_full_history(&self) -> bool {
        self.len() >= FULL_HISTORY_BARS
    }

    pub fn ma20(&self) -> &[f64] {
        &self.ma20
    }

    pub fn ma60(&self) -> &[f64] {
        &self.ma60
    }

    pub fn rsi14(&self) -> &[f64] {
        &self.rsi14
    }

    pub fn bb_mid(&self) -> &[f64] {
        &self.bb_mid
    }

    pub fn bb_upper(&self) -> &[f64] {
        &self.bb_upper
    }

    pub fn bb_lower(&self) -> &[f64] {
        &self.bb_lower
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let bar = self.series.bars().get(index)?;
        Some(IndicatorRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            ma20: defined(self.ma20[index]),
            ma60: defined(self.ma60[index]),
            rsi14: defined(self.rsi14[index]),
            bb_mid: defined(self.bb_mid[index]),
            bb_upper: defined(self.bb_upper[index]),
            bb_lower: defined(self.bb_lower[index]),
        })
    }

    pub fn last_row(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }
}

fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}
