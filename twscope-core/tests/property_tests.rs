//! Property tests for the scoring pipeline.
//!
//! Uses proptest to verify:
//! 1. Score bounds: the clamped score stays in [0, 100] for arbitrary inputs
//! 2. Reason accounting: one reason per fired rule, score = 50 + sum of deltas (pre-clamp)
//! 3. Determinism: the same frame always scores identically
//! 4. Level ordering: stop < entry < target for any positive price
//! 5. MA20 definition: mean of the trailing 20 closes, undefined before that

use proptest::prelude::*;
use twscope_core::domain::{Bar, Fundamentals, PriceSeries};
use twscope_core::indicators::IndicatorFrame;
use twscope_core::levels::StrategyLevels;
use twscope_core::scoring::{self, Action, ScoreInputs, BASE_SCORE, RULES};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..2000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), 0..max_len)
}

fn arb_fundamentals() -> impl Strategy<Value = Fundamentals> {
    (
        prop::option::of(-50.0..80.0_f64),
        prop::option::of(-0.5..0.8_f64),
    )
        .prop_map(|(pe, roe)| Fundamentals {
            trailing_pe: pe,
            return_on_equity: roe,
            long_name: None,
        })
}

fn arb_inputs() -> impl Strategy<Value = ScoreInputs> {
    (
        arb_price(),
        prop::option::of(-20.0..20.0_f64),
        0.0..1e7_f64,
        1.0..1e7_f64,
        prop::option::of(arb_price()),
        prop::option::of(arb_price()),
        arb_fundamentals(),
    )
        .prop_map(|(close, change_pct, volume, avg_volume, ma20, ma60, f)| ScoreInputs {
            close,
            change_pct,
            volume,
            avg_volume,
            ma20,
            ma60,
            return_on_equity: f.return_on_equity,
            trailing_pe: f.trailing_pe,
        })
}

fn frame_from(closes: &[f64], volumes: &[u64]) -> IndicatorFrame {
    let base = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: volumes.get(i).copied().unwrap_or(1000),
        })
        .collect();
    IndicatorFrame::compute(PriceSeries::new("PROP.TW", bars).unwrap())
}

// ── 1-3. Scoring ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_bounded(inputs in arb_inputs()) {
        let result = scoring::evaluate(&inputs);
        prop_assert!(result.score <= 100);
        prop_assert_eq!(result.action, Action::from_score(result.score));
    }

    #[test]
    fn reasons_match_fired_rules(inputs in arb_inputs()) {
        let fired: Vec<_> = RULES.iter().filter(|r| (r.applies)(&inputs)).collect();
        let result = scoring::evaluate(&inputs);

        prop_assert_eq!(result.reasons.len(), fired.len());
        for (reason, rule) in result.reasons.iter().zip(&fired) {
            prop_assert_eq!(*reason, rule.reason);
        }
        let raw: i32 = BASE_SCORE + fired.iter().map(|r| r.delta).sum::<i32>();
        prop_assert_eq!(i32::from(result.score), raw.clamp(0, 100));
    }

    #[test]
    fn scoring_frames_is_deterministic(
        closes in arb_closes(90),
        fundamentals in arb_fundamentals(),
    ) {
        let frame = frame_from(&closes, &[]);
        let a = scoring::score(&frame, &fundamentals);
        let b = scoring::score(&frame.clone(), &fundamentals);
        prop_assert_eq!(&a, &b);
        if closes.len() < 2 {
            prop_assert_eq!(a.action, Action::InsufficientData);
            prop_assert_eq!(a.score, 50);
        }
    }

    #[test]
    fn momentum_bands_are_exclusive(inputs in arb_inputs()) {
        let result = scoring::evaluate(&inputs);
        let momentum = result
            .reasons
            .iter()
            .filter(|r| matches!(r.label(), "healthy-momentum" | "overextended-strength" | "heavy-selling"))
            .count();
        prop_assert!(momentum <= 1);
    }
}

// ── 4. Strategy levels ───────────────────────────────────────────────

proptest! {
    #[test]
    fn levels_are_ordered(
        price in 0.01..1e6_f64,
        score in 0u8..=100,
        roe in prop::option::of(-100.0..100.0_f64),
    ) {
        let levels = StrategyLevels::compute(price, score, roe).unwrap();
        for side in [levels.momentum, levels.value] {
            prop_assert!(side.stop < side.entry);
            prop_assert!(side.entry < side.profit_target);
            prop_assert!(side.entry < price);
        }
    }
}

// ── 5. MA20 definition ───────────────────────────────────────────────

proptest! {
    #[test]
    fn ma20_is_trailing_mean(closes in arb_closes(80)) {
        let frame = frame_from(&closes, &[]);
        for (t, &value) in frame.ma20().iter().enumerate() {
            if t < 19 {
                prop_assert!(value.is_nan());
            } else {
                let expected = closes[t - 19..=t].iter().sum::<f64>() / 20.0;
                prop_assert!((value - expected).abs() < 1e-9 * expected.max(1.0));
            }
        }
    }

    #[test]
    fn rsi_stays_in_range(closes in arb_closes(80)) {
        let frame = frame_from(&closes, &[]);
        for (t, &value) in frame.rsi14().iter().enumerate() {
            if t < 14 {
                prop_assert!(value.is_nan());
            } else if !value.is_nan() {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }
    }
}
