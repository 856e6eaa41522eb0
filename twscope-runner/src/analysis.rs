//! Single-symbol analysis: fetch, indicators, score, levels, narrative.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use twscope_core::data::{fetch_with_fallback, DataError, MarketDataProvider};
use twscope_core::domain::{Fundamentals, Period, PriceSeries};
use twscope_core::indicators::{IndicatorFrame, IndicatorRow};
use twscope_core::levels::{LevelsError, StrategyLevels};
use twscope_core::narrative;
use twscope_core::scoring::{self, ScoreResult};

/// Shares per board lot on the Taiwan exchanges.
pub const BOARD_LOT: f64 = 1000.0;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no data for '{code}': {source}")]
    NoData {
        code: String,
        #[source]
        source: DataError,
    },

    #[error("data error for '{code}': {source}")]
    Data {
        code: String,
        #[source]
        source: DataError,
    },

    #[error("cannot derive levels for '{code}': {source}")]
    Levels {
        code: String,
        #[source]
        source: LevelsError,
    },
}

/// Secondary figures shown next to the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailMetrics {
    pub rsi14: Option<f64>,
    /// Last session volume in board lots.
    pub volume_lots: f64,
    pub trailing_pe: Option<f64>,
    pub roe_percent: Option<f64>,
}

/// Everything the dashboard shows for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct StockAnalysis {
    /// Code as typed by the user.
    pub code: String,
    /// Symbol that actually answered (`.TW` or `.TWO`).
    pub symbol: String,
    pub name: String,
    pub period: Period,
    pub last: IndicatorRow,
    pub change_pct: Option<f64>,
    pub score: ScoreResult,
    pub levels: StrategyLevels,
    pub metrics: DetailMetrics,
    pub fundamentals: Fundamentals,
    pub narrative: String,
    pub bars: usize,
    pub fingerprint: String,
    #[serde(skip)]
    pub frame: IndicatorFrame,
}

/// Fetch a code (with `.TWO` fallback) and analyze it.
pub fn analyze_symbol(
    provider: &dyn MarketDataProvider,
    code: &str,
    period: Period,
) -> Result<StockAnalysis, AnalysisError> {
    let series = fetch_with_fallback(provider, code, period).map_err(|source| {
        if source.is_no_data() {
            AnalysisError::NoData {
                code: code.to_string(),
                source,
            }
        } else {
            AnalysisError::Data {
                code: code.to_string(),
                source,
            }
        }
    })?;
    debug!(code, symbol = series.symbol(), bars = series.len(), "series fetched");

    let fundamentals = provider.fetch_fundamentals(series.symbol());
    let analysis = analyze_series(code, period, series, fundamentals)?;
    info!(
        code,
        symbol = %analysis.symbol,
        score = analysis.score.score,
        action = %analysis.score.action,
        "analysis complete"
    );
    Ok(analysis)
}

/// Analyze an already-fetched series.
pub fn analyze_series(
    code: &str,
    period: Period,
    series: PriceSeries,
    fundamentals: Fundamentals,
) -> Result<StockAnalysis, AnalysisError> {
    let symbol = series.symbol().to_string();
    let fingerprint = series.fingerprint();
    let change_pct = series.last_change_pct();
    let name = fundamentals
        .long_name
        .as_deref()
        .or_else(|| series.display_name())
        .unwrap_or(&symbol)
        .to_string();

    let frame = IndicatorFrame::compute(series);
    let last = frame.last_row().ok_or_else(|| AnalysisError::NoData {
        code: code.to_string(),
        source: DataError::EmptySeries {
            symbol: symbol.clone(),
        },
    })?;

    let score = scoring::score(&frame, &fundamentals);
    let levels = StrategyLevels::compute(last.close, score.score, fundamentals.roe_percent())
        .map_err(|source| AnalysisError::Levels {
            code: code.to_string(),
            source,
        })?;
    let narrative = narrative::summarize(&frame);

    let metrics = DetailMetrics {
        rsi14: last.rsi14,
        volume_lots: last.volume as f64 / BOARD_LOT,
        trailing_pe: fundamentals.trailing_pe,
        roe_percent: fundamentals.roe_percent(),
    };

    Ok(StockAnalysis {
        code: code.to_string(),
        symbol,
        name,
        period,
        last,
        change_pct,
        score,
        levels,
        metrics,
        fundamentals,
        narrative,
        bars: frame.len(),
        fingerprint,
        frame,
    })
}
