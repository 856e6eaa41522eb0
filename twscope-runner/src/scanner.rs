//! Batch scanner: a quick quote and fast score for many symbols at once.
//!
//! Each symbol gets an explicit outcome; one failing symbol never hides the
//! others. Symbols are fetched in parallel with rayon.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use twscope_core::data::{fetch_with_fallback, MarketDataProvider};
use twscope_core::domain::Period;

/// Look-back used for quotes.
pub const SCAN_PERIOD: Period = Period::FiveDays;
pub const FAST_SCORE_MIN: f64 = 1.0;
pub const FAST_SCORE_MAX: f64 = 99.0;

/// `trunc(clamp(50 + 2 * change_pct, 1, 99))`.
pub fn fast_score(change_pct: f64) -> u8 {
    (50.0 + 2.0 * change_pct).clamp(FAST_SCORE_MIN, FAST_SCORE_MAX).trunc() as u8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub code: String,
    pub symbol: String,
    pub display_name: String,
    pub last_price: f64,
    pub change_pct: f64,
    pub fast_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanOutcome {
    Quoted(Quote),
    Failed { code: String, error: String },
}

impl ScanOutcome {
    pub fn code(&self) -> &str {
        match self {
            ScanOutcome::Quoted(q) => &q.code,
            ScanOutcome::Failed { code, .. } => code,
        }
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            ScanOutcome::Quoted(q) => Some(q),
            ScanOutcome::Failed { .. } => None,
        }
    }
}

/// Outcomes in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub outcomes: Vec<ScanOutcome>,
}

impl ScanReport {
    /// Successful quotes keyed by input code.
    pub fn quotes(&self) -> BTreeMap<&str, &Quote> {
        self.outcomes
            .iter()
            .filter_map(|o| o.quote().map(|q| (q.code.as_str(), q)))
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            ScanOutcome::Failed { code, error } => Some((code.as_str(), error.as_str())),
            ScanOutcome::Quoted(_) => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.quote().is_some()).count()
    }
}

/// Quote one code. Needs at least two bars and a usable previous close.
pub fn quote_symbol(provider: &dyn MarketDataProvider, code: &str) -> ScanOutcome {
    let failed = |error: String| ScanOutcome::Failed {
        code: code.to_string(),
        error,
    };

    let series = match fetch_with_fallback(provider, code, SCAN_PERIOD) {
        Ok(series) => series,
        Err(e) => return failed(e.to_string()),
    };
    if series.len() < 2 {
        return failed(format!("need at least two bars, got {}", series.len()));
    }
    let (Some(last), Some(change_pct)) = (series.last(), series.last_change_pct()) else {
        return failed("previous close is not usable".to_string());
    };

    ScanOutcome::Quoted(Quote {
        code: code.to_string(),
        symbol: series.symbol().to_string(),
        display_name: series.display_name().unwrap_or(code).to_string(),
        last_price: last.close,
        change_pct,
        fast_score: fast_score(change_pct),
    })
}

/// Batch scanner over a provider.
pub struct BatchScanner<'a> {
    provider: &'a dyn MarketDataProvider,
    parallel: bool,
}

impl<'a> BatchScanner<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider) -> Self {
        Self {
            provider,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn scan<S: AsRef<str> + Sync>(&self, codes: &[S]) -> ScanReport {
        let outcomes: Vec<ScanOutcome> = if self.parallel {
            codes
                .par_iter()
                .map(|code| quote_symbol(self.provider, code.as_ref()))
                .collect()
        } else {
            codes
                .iter()
                .map(|code| quote_symbol(self.provider, code.as_ref()))
                .collect()
        };

        let report = ScanReport { outcomes };
        for (code, error) in report.failures() {
            warn!(code, error, "scan failed");
        }
        info!(
            total = report.outcomes.len(),
            quoted = report.success_count(),
            "scan complete"
        );
        report
    }
}
