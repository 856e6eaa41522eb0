//! Strategy levels: entry, stop and profit target for two independent playbooks.
//!
//! - Momentum: buy close to the market when the score is strong, tight stop.
//! - Value: wait for a deeper pullback, wider stop, larger target.
//!
//! Pure arithmetic on (last price, score, ROE%).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score above which the momentum entry sits closer to the last price.
pub const MOMENTUM_STRONG_SCORE: u8 = 70;
/// ROE (percent) above which the value entry discount narrows.
pub const VALUE_QUALITY_ROE_PCT: f64 = 15.0;

#[derive(Debug, Error, PartialEq)]
pub enum LevelsError {
    #[error("last price must be positive and finite, got {0}")]
    InvalidPrice(f64),
}

/// One entry/stop/target triple. Always `stop < entry < profit_target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub entry: f64,
    pub stop: f64,
    pub profit_target: f64,
}

impl PriceLevels {
    /// Entry as a fraction of the last price; stop and target as fractions of the entry.
    fn from_fractions(last_price: f64, entry_frac: f64, stop_frac: f64, target_frac: f64) -> Self {
        let entry = last_price * entry_frac;
        Self {
            entry,
            stop: entry * stop_frac,
            profit_target: entry * target_frac,
        }
    }

    /// Reward-to-risk ratio of this setup.
    pub fn reward_risk(&self) -> f64 {
        (self.profit_target - self.entry) / (self.entry - self.stop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyLevels {
    pub momentum: PriceLevels,
    pub value: PriceLevels,
}

impl StrategyLevels {
    /// Derive both playbooks. A missing ROE takes the wider value discount.
    pub fn compute(
        last_price: f64,
        score: u8,
        roe_percent: Option<f64>,
    ) -> Result<Self, LevelsError> {
        if !last_price.is_finite() || last_price <= 0.0 {
            return Err(LevelsError::InvalidPrice(last_price));
        }

        let momentum_entry = if score > MOMENTUM_STRONG_SCORE { 0.98 } else { 0.95 };
        let value_entry = match roe_percent {
            Some(roe) if roe > VALUE_QUALITY_ROE_PCT => 0.90,
            _ => 0.85,
        };

        Ok(Self {
            momentum: PriceLevels::from_fractions(last_price, momentum_entry, 0.93, 1.15),
            value: PriceLevels::from_fractions(last_price, value_entry, 0.85, 1.30),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn strong_score_quality_roe_example() {
        let levels = StrategyLevels::compute(100.0, 75, Some(20.0)).unwrap();
        approx(levels.momentum.entry, 98.0);
        approx(levels.momentum.stop, 91.14);
        approx(levels.momentum.profit_target, 112.7);
        approx(levels.value.entry, 90.0);
        approx(levels.value.stop, 76.5);
        approx(levels.value.profit_target, 117.0);
    }

    #[test]
    fn weak_score_and_missing_roe_take_wider_discounts() {
        let levels = StrategyLevels::compute(100.0, 70, None).unwrap();
        approx(levels.momentum.entry, 95.0);
        approx(levels.value.entry, 85.0);
    }

    #[test]
    fn roe_threshold_is_exclusive() {
        let levels = StrategyLevels::compute(200.0, 50, Some(15.0)).unwrap();
        approx(levels.value.entry, 170.0);
    }

    #[test]
    fn rejects_non_positive_price() {
        assert_eq!(
            StrategyLevels::compute(0.0, 50, None),
            Err(LevelsError::InvalidPrice(0.0))
        );
        assert!(StrategyLevels::compute(-1.0, 50, None).is_err());
        assert!(StrategyLevels::compute(f64::NAN, 50, None).is_err());
    }

    #[test]
    fn reward_risk_ratios() {
        let levels = StrategyLevels::compute(100.0, 90, Some(30.0)).unwrap();
        // momentum: +15% / -7%, value: +30% / -15%
        approx(levels.momentum.reward_risk(), 15.0 / 7.0);
        approx(levels.value.reward_risk(), 2.0);
    }
}
