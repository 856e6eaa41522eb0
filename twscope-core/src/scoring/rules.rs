//! The canonical scoring rule table.
//!
//! Each row is a predicate over `ScoreInputs`, an additive delta and the
//! reason it records. Rows are evaluated top to bottom; the order only affects
//! the order of reasons, never the final number.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{change_pct, Fundamentals};
use crate::indicators::IndicatorFrame;

/// Number of trailing bars averaged for the volume baseline (current bar included).
pub const VOLUME_WINDOW: usize = 5;
pub const VOLUME_BREAKOUT_RATIO: f64 = 1.5;
/// Percent above MA20 beyond which the short term counts as overheated.
pub const OVERHEATED_BIAS_PCT: f64 = 10.0;
pub const HIGH_ROE: f64 = 0.15;
pub const ATTRACTIVE_PE: f64 = 20.0;

/// Why the score moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[serde(rename = "healthy-momentum")]
    HealthyMomentum,
    #[serde(rename = "overextended-strength")]
    OverextendedStrength,
    #[serde(rename = "heavy-selling")]
    HeavySelling,
    #[serde(rename = "volume-breakout")]
    VolumeBreakout,
    #[serde(rename = "above-MA20")]
    AboveMa20,
    #[serde(rename = "bullish-alignment")]
    BullishAlignment,
    #[serde(rename = "below-MA20")]
    BelowMa20,
    #[serde(rename = "overheated-short-term")]
    OverheatedShortTerm,
    #[serde(rename = "high-quality-roe")]
    HighQualityRoe,
    #[serde(rename = "attractive-valuation")]
    AttractiveValuation,
}

impl Reason {
    pub fn label(self) -> &'static str {
        match self {
            Reason::HealthyMomentum => "healthy-momentum",
            Reason::OverextendedStrength => "overextended-strength",
            Reason::HeavySelling => "heavy-selling",
            Reason::VolumeBreakout => "volume-breakout",
            Reason::AboveMa20 => "above-MA20",
            Reason::BullishAlignment => "bullish-alignment",
            Reason::BelowMa20 => "below-MA20",
            Reason::OverheatedShortTerm => "overheated-short-term",
            Reason::HighQualityRoe => "high-quality-roe",
            Reason::AttractiveValuation => "attractive-valuation",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the rule table looks at, extracted from the last two bars.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreInputs {
    pub close: f64,
    /// Percent change of the last close versus the previous one.
    pub change_pct: Option<f64>,
    pub volume: f64,
    pub avg_volume: f64,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub trailing_pe: Option<f64>,
}

impl ScoreInputs {
    /// Extract inputs from the frame's last two bars. `None` with fewer than two bars.
    pub fn from_frame(frame: &IndicatorFrame, fundamentals: &Fundamentals) -> Option<Self> {
        let n = frame.len();
        if n < 2 {
            return None;
        }
        let bars = frame.bars();
        let last = frame.last_row()?;
        let recent = frame.series().tail(VOLUME_WINDOW);
        let avg_volume =
            recent.iter().map(|b| b.volume as f64).sum::<f64>() / recent.len() as f64;

        Some(Self {
            close: last.close,
            change_pct: change_pct(bars[n - 2].close, last.close),
            volume: last.volume as f64,
            avg_volume,
            ma20: last.ma20,
            ma60: last.ma60,
            return_on_equity: fundamentals.return_on_equity,
            trailing_pe: fundamentals.trailing_pe,
        })
    }

    /// Percent deviation of the close from MA20; `None` when MA20 is undefined or zero.
    pub fn bias(&self) -> Option<f64> {
        match self.ma20 {
            Some(ma) if ma != 0.0 && !self.close.is_nan() => Some((self.close - ma) / ma * 100.0),
            _ => None,
        }
    }

    fn change_in(&self, pred: impl Fn(f64) -> bool) -> bool {
        self.change_pct.is_some_and(pred)
    }

    fn above_ma20(&self) -> bool {
        self.ma20.is_some_and(|ma| self.close > ma)
    }
}

/// One row of the rule table.
pub struct ScoreRule {
    pub reason: Reason,
    pub delta: i32,
    pub applies: fn(&ScoreInputs) -> bool,
}

impl fmt::Debug for ScoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreRule")
            .field("reason", &self.reason)
            .field("delta", &self.delta)
            .finish()
    }
}

/// The single source of truth for the composite score.
pub const RULES: &[ScoreRule] = &[
    // Momentum: the three bands are mutually exclusive.
    ScoreRule {
        reason: Reason::HealthyMomentum,
        delta: 8,
        applies: |i| i.change_in(|c| c > 3.0 && c < 7.0),
    },
    ScoreRule {
        reason: Reason::OverextendedStrength,
        delta: 5,
        applies: |i| i.change_in(|c| c >= 7.0),
    },
    ScoreRule {
        reason: Reason::HeavySelling,
        delta: -8,
        applies: |i| i.change_in(|c| c < -4.0),
    },
    // Volume
    ScoreRule {
        reason: Reason::VolumeBreakout,
        delta: 5,
        applies: |i| i.volume > i.avg_volume * VOLUME_BREAKOUT_RATIO,
    },
    // Trend
    ScoreRule {
        reason: Reason::AboveMa20,
        delta: 10,
        applies: |i| i.above_ma20(),
    },
    ScoreRule {
        reason: Reason::BullishAlignment,
        delta: 10,
        applies: |i| {
            i.above_ma20()
                && matches!((i.ma20, i.ma60), (Some(short), Some(long)) if short > long)
        },
    },
    ScoreRule {
        reason: Reason::BelowMa20,
        delta: -10,
        applies: |i| i.ma20.is_some() && !i.above_ma20(),
    },
    // Bias
    ScoreRule {
        reason: Reason::OverheatedShortTerm,
        delta: -5,
        applies: |i| i.bias().is_some_and(|b| b > OVERHEATED_BIAS_PCT),
    },
    // Fundamentals
    ScoreRule {
        reason: Reason::HighQualityRoe,
        delta: 8,
        applies: |i| i.return_on_equity.is_some_and(|roe| roe > HIGH_ROE),
    },
    ScoreRule {
        reason: Reason::AttractiveValuation,
        delta: 7,
        applies: |i| i.trailing_pe.is_some_and(|pe| pe > 0.0 && pe < ATTRACTIVE_PE),
    },
];
