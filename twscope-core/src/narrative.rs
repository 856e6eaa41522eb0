//! Candle narrative: a one-line description of the most recent bars.
//!
//! Used only as context for the report prompt.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{change_pct, Bar};
use crate::indicators::IndicatorFrame;

/// Bars described by the narrative.
pub const NARRATIVE_BARS: usize = 5;
/// Body/range ratio below which a candle reads as a doji.
pub const DOJI_BODY_FRACTION: f64 = 0.15;

pub const INSUFFICIENT_DATA: &str = "insufficient data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleTag {
    Doji,
    Bullish,
    Bearish,
}

impl CandleTag {
    pub fn classify(bar: &Bar) -> Self {
        let range = bar.range();
        if range > 0.0 && bar.body() / range < DOJI_BODY_FRACTION {
            CandleTag::Doji
        } else if bar.close > bar.open {
            CandleTag::Bullish
        } else {
            CandleTag::Bearish
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CandleTag::Doji => "doji",
            CandleTag::Bullish => "bullish",
            CandleTag::Bearish => "bearish",
        }
    }
}

impl fmt::Display for CandleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `[MM-DD] close(change%): tag` tokens for the last five bars, oldest first,
/// joined with ` -> `. The first bar in the window reports a 0.0% change.
pub fn summarize(frame: &IndicatorFrame) -> String {
    let window = frame.series().tail(NARRATIVE_BARS);
    if window.is_empty() {
        return INSUFFICIENT_DATA.to_string();
    }

    window
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let change = if i == 0 {
                0.0
            } else {
                change_pct(window[i - 1].close, bar.close).unwrap_or(0.0)
            };
            format!(
                "[{}] {:.1}({:.1}%): {}",
                bar.date.format("%m-%d"),
                bar.close,
                change,
                CandleTag::classify(bar)
            )
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}
