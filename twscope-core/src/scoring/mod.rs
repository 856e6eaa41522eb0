//! Composite 0–100 score with explainable reasons.
//!
//! Base score 50, then every row of [`rules::RULES`] that holds adds its delta
//! and records its reason. The total is clamped to [0, 100] last; clamping
//! never drops a recorded reason.

pub mod rules;

pub use rules::{Reason, ScoreInputs, ScoreRule, RULES};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Fundamentals;
use crate::indicators::IndicatorFrame;

pub const BASE_SCORE: i32 = 50;

/// Action label derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    StrongBuy,
    ModeratelyBullish,
    NeutralWatch,
    Defensive,
    Caution,
    InsufficientData,
}

impl Action {
    /// Threshold table: 80 / 65 / 45 / 25.
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Action::StrongBuy,
            65..=79 => Action::ModeratelyBullish,
            45..=64 => Action::NeutralWatch,
            25..=44 => Action::Defensive,
            _ => Action::Caution,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::StrongBuy => "strong-buy",
            Action::ModeratelyBullish => "moderately-bullish",
            Action::NeutralWatch => "neutral-watch",
            Action::Defensive => "defensive",
            Action::Caution => "caution",
            Action::InsufficientData => "insufficient-data",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one scoring pass. Derived fresh each time, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub action: Action,
    pub reasons: Vec<Reason>,
    /// Percent deviation of the last close from MA20.
    pub bias: Option<f64>,
}

impl ScoreResult {
    /// Neutral result used when there is not enough history to score.
    pub fn insufficient_data() -> Self {
        Self {
            score: BASE_SCORE as u8,
            action: Action::InsufficientData,
            reasons: Vec::new(),
            bias: None,
        }
    }
}

/// Score the last bar of a frame. Fewer than two bars yields the neutral result.
pub fn score(frame: &IndicatorFrame, fundamentals: &Fundamentals) -> ScoreResult {
    match ScoreInputs::from_frame(frame, fundamentals) {
        Some(inputs) => evaluate(&inputs),
        None => ScoreResult::insufficient_data(),
    }
}

/// Run the rule table over prepared inputs.
pub fn evaluate(inputs: &ScoreInputs) -> ScoreResult {
    let mut total = BASE_SCORE;
    let mut reasons = Vec::new();
    for rule in RULES {
        if (rule.applies)(inputs) {
            total += rule.delta;
            reasons.push(rule.reason);
        }
    }

    let score = total.clamp(0, 100) as u8;
    ScoreResult {
        score,
        action: Action::from_score(score),
        reasons,
        bias: inputs.bias(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, PriceSeries};
    use chrono::NaiveDate;

    fn frame_with(closes: &[f64], volumes: &[u64]) -> IndicatorFrame {
        let base = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume,
            })
            .collect();
        IndicatorFrame::compute(PriceSeries::new("2330.TW", bars).unwrap())
    }

    #[test]
    fn short_uptrend_example() {
        let frame = frame_with(&[100.0, 103.0, 107.0], &[1000, 1000, 1000]);
        let result = score(&frame, &Fundamentals::default());
        assert_eq!(result.score, 58);
        assert_eq!(result.action, Action::NeutralWatch);
        assert_eq!(result.reasons, vec![Reason::HealthyMomentum]);
        assert_eq!(result.bias, None);
    }

    #[test]
    fn heavy_selling_example() {
        let frame = frame_with(&[100.0, 95.0], &[1000, 1000]);
        let result = score(&frame, &Fundamentals::default());
        assert_eq!(result.score, 42);
        assert_eq!(result.reasons, vec![Reason::HeavySelling]);
        assert_eq!(result.action, Action::Defensive);
    }

    #[test]
    fn fewer_than_two_bars_is_neutral() {
        let frame = frame_with(&[100.0], &[1000]);
        let result = score(&frame, &Fundamentals::default());
        assert_eq!(result, ScoreResult::insufficient_data());
        assert_eq!(result.score, 50);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn volume_breakout_and_fundamentals() {
        // avg of [1000, 1000, 4000] = 2000; 4000 > 3000
        let frame = frame_with(&[100.0, 100.0, 100.0], &[1000, 1000, 4000]);
        let fundamentals = Fundamentals {
            trailing_pe: Some(15.0),
            return_on_equity: Some(0.25),
            long_name: None,
        };
        let result = score(&frame, &fundamentals);
        assert_eq!(
            result.reasons,
            vec![
                Reason::VolumeBreakout,
                Reason::HighQualityRoe,
                Reason::AttractiveValuation
            ]
        );
        assert_eq!(result.score, 70);
        assert_eq!(result.action, Action::ModeratelyBullish);
    }

    #[test]
    fn full_bull_stack_records_every_reason() {
        let inputs = ScoreInputs {
            close: 130.0,
            change_pct: Some(5.0),
            volume: 5000.0,
            avg_volume: 1000.0,
            ma20: Some(110.0),
            ma60: Some(100.0),
            return_on_equity: Some(0.3),
            trailing_pe: Some(10.0),
        };
        // 50 + 8 + 5 + 10 + 10 - 5 + 8 + 7 = 93
        let result = evaluate(&inputs);
        assert_eq!(result.score, 93);
        assert_eq!(result.action, Action::StrongBuy);
        assert_eq!(result.reasons.len(), 7);
        assert!(result.reasons.contains(&Reason::OverheatedShortTerm));
    }

    #[test]
    fn bearish_stack_is_defensive() {
        let inputs = ScoreInputs {
            close: 80.0,
            change_pct: Some(-9.0),
            volume: 1000.0,
            avg_volume: 1000.0,
            ma20: Some(100.0),
            ma60: Some(110.0),
            return_on_equity: Some(-0.1),
            trailing_pe: Some(-3.0),
        };
        let result = evaluate(&inputs);
        assert_eq!(result.score, 32);
        assert_eq!(result.action, Action::Defensive);
        assert_eq!(result.reasons, vec![Reason::HeavySelling, Reason::BelowMa20]);
        assert!(result.bias.unwrap() < 0.0);
    }

    #[test]
    fn action_thresholds() {
        assert_eq!(Action::from_score(100), Action::StrongBuy);
        assert_eq!(Action::from_score(80), Action::StrongBuy);
        assert_eq!(Action::from_score(79), Action::ModeratelyBullish);
        assert_eq!(Action::from_score(65), Action::ModeratelyBullish);
        assert_eq!(Action::from_score(64), Action::NeutralWatch);
        assert_eq!(Action::from_score(45), Action::NeutralWatch);
        assert_eq!(Action::from_score(44), Action::Defensive);
        assert_eq!(Action::from_score(25), Action::Defensive);
        assert_eq!(Action::from_score(24), Action::Caution);
        assert_eq!(Action::from_score(0), Action::Caution);
    }

    #[test]
    fn action_serializes_kebab_case() {
        let json = serde_json::to_string(&Action::ModeratelyBullish).unwrap();
        assert_eq!(json, "\"moderately-bullish\"");
    }
}
