//! Market pulse and hot picks: named symbol lists quoted through the scanner.

use serde::Serialize;

use twscope_core::data::MarketDataProvider;

use crate::config::NamedSymbol;
use crate::scanner::{BatchScanner, ScanOutcome};

/// A scan outcome with the configured label attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledOutcome {
    pub name: String,
    #[serde(flatten)]
    pub outcome: ScanOutcome,
}

impl LabeledOutcome {
    pub fn change_pct(&self) -> Option<f64> {
        self.outcome.quote().map(|q| q.change_pct)
    }
}

fn quote_named(provider: &dyn MarketDataProvider, symbols: &[NamedSymbol]) -> Vec<LabeledOutcome> {
    let codes: Vec<&str> = symbols.iter().map(|s| s.code.as_str()).collect();
    let report = BatchScanner::new(provider).scan(&codes);
    symbols
        .iter()
        .zip(report.outcomes)
        .map(|(s, outcome)| LabeledOutcome {
            name: s.name.clone(),
            outcome,
        })
        .collect()
}

/// Last value and percent change for each index.
pub fn market_pulse(provider: &dyn MarketDataProvider, indices: &[NamedSymbol]) -> Vec<LabeledOutcome> {
    quote_named(provider, indices)
}

/// Quotes for the configured hot picks.
pub fn hot_picks(provider: &dyn MarketDataProvider, picks: &[NamedSymbol]) -> Vec<LabeledOutcome> {
    quote_named(provider, picks)
}
