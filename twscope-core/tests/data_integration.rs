//! Integration tests for the data boundary: listing fallback, caching and the
//! synthetic provider feeding the analysis pipeline.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use twscope_core::data::{
    fetch_with_fallback, CachePolicy, CachedProvider, DataError, MarketDataProvider,
    SyntheticProvider,
};
use twscope_core::domain::{Bar, Fundamentals, Period, PriceSeries};
use twscope_core::indicators::IndicatorFrame;
use twscope_core::levels::StrategyLevels;
use twscope_core::{narrative, scoring};

/// Scripted provider: each symbol maps to a fixed answer; every call is recorded.
struct ScriptedProvider {
    answers: HashMap<String, Result<Vec<f64>, DataError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(answers: Vec<(&str, Result<Vec<f64>, DataError>)>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(|(s, a)| (s.to_string(), a))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn bars(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_series(&self, symbol: &str, _period: Period) -> Result<PriceSeries, DataError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        match self.answers.get(symbol) {
            Some(Ok(closes)) => Ok(PriceSeries::new(symbol, bars(closes))?),
            Some(Err(e)) => Err(e.clone()),
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn fetch_fundamentals(&self, _symbol: &str) -> Fundamentals {
        Fundamentals::default()
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ── Listing fallback ─────────────────────────────────────────────────

#[test]
fn listed_symbol_resolves_without_fallback() {
    let provider = ScriptedProvider::new(vec![("2330.TW", Ok(vec![1000.0, 1010.0]))]);
    let series = fetch_with_fallback(&provider, "2330", Period::OneYear).unwrap();
    assert_eq!(series.symbol(), "2330.TW");
    assert_eq!(provider.calls(), vec!["2330.TW"]);
}

#[test]
fn otc_symbol_found_after_listed_miss() {
    let provider = ScriptedProvider::new(vec![("6488.TWO", Ok(vec![500.0, 505.0]))]);
    let series = fetch_with_fallback(&provider, "6488", Period::OneYear).unwrap();
    assert_eq!(series.symbol(), "6488.TWO");
    assert_eq!(provider.calls(), vec!["6488.TW", "6488.TWO"]);
}

#[test]
fn empty_listed_series_also_falls_back() {
    let provider = ScriptedProvider::new(vec![
        ("6488.TW", Ok(vec![])),
        ("6488.TWO", Ok(vec![500.0])),
    ]);
    let series = fetch_with_fallback(&provider, "6488", Period::FiveDays).unwrap();
    assert_eq!(series.symbol(), "6488.TWO");
}

#[test]
fn missing_everywhere_reports_the_listed_symbol() {
    let provider = ScriptedProvider::new(vec![]);
    let err = fetch_with_fallback(&provider, "9999", Period::OneYear).unwrap_err();
    assert_eq!(
        err,
        DataError::SymbolNotFound {
            symbol: "9999.TW".into()
        }
    );
}

#[test]
fn network_errors_skip_the_fallback() {
    let provider = ScriptedProvider::new(vec![(
        "2330.TW",
        Err(DataError::NetworkUnreachable("connection refused".into())),
    )]);
    let err = fetch_with_fallback(&provider, "2330", Period::OneYear).unwrap_err();
    assert!(matches!(err, DataError::NetworkUnreachable(_)));
    assert_eq!(provider.calls(), vec!["2330.TW"]);
}

#[test]
fn index_codes_never_fall_back() {
    let provider = ScriptedProvider::new(vec![]);
    let err = fetch_with_fallback(&provider, "^TWII", Period::FiveDays).unwrap_err();
    assert!(err.is_no_data());
    assert_eq!(provider.calls(), vec!["^TWII"]);
}

// ── Caching ──────────────────────────────────────────────────────────

#[test]
fn cache_sits_under_the_fallback() {
    let provider = CachedProvider::new(
        ScriptedProvider::new(vec![("6488.TWO", Ok(vec![500.0, 505.0]))]),
        CachePolicy::default(),
    );
    fetch_with_fallback(&provider, "6488", Period::OneYear).unwrap();
    fetch_with_fallback(&provider, "6488", Period::OneYear).unwrap();
    // misses are not cached, hits are
    assert_eq!(
        provider.inner().calls(),
        vec!["6488.TW", "6488.TWO", "6488.TW"]
    );
}

// ── Synthetic pipeline ───────────────────────────────────────────────

#[test]
fn synthetic_series_flows_through_the_pipeline() {
    let provider = SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 7, 5).unwrap());
    let series = fetch_with_fallback(&provider, "2330", Period::OneYear).unwrap();
    assert!(series.len() > 200);

    let fundamentals = provider.fetch_fundamentals(series.symbol());
    let frame = IndicatorFrame::compute(series);
    assert!(frame.has_full_history());
    let last = frame.last_row().unwrap();
    assert!(last.ma20.is_some() && last.ma60.is_some() && last.rsi14.is_some());

    let result = scoring::score(&frame, &fundamentals);
    assert!(result.score <= 100);
    assert!(result.bias.is_some());

    let levels = StrategyLevels::compute(last.close, result.score, fundamentals.roe_percent()).unwrap();
    assert!(levels.momentum.stop < levels.momentum.entry);

    let text = narrative::summarize(&frame);
    assert_eq!(text.split(" -> ").count(), 5);
}
