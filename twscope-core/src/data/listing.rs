//! Taiwan listing rules: turning user codes into provider symbols.
//!
//! TWSE-listed stocks use the `.TW` suffix, TPEx (OTC) stocks use `.TWO`.
//! Users type bare codes, so a `.TW` miss is retried as `.TWO`.

use tracing::{debug, warn};

use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Period, PriceSeries};

pub const LISTED_SUFFIX: &str = ".TW";
pub const OTC_SUFFIX: &str = ".TWO";

/// All-digit codes become `{code}.TW`; everything else (index codes such as
/// `^TWII`, already-suffixed symbols) passes through trimmed.
pub fn resolve_symbol(code: &str) -> String {
    let code = code.trim();
    if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
        format!("{code}{LISTED_SUFFIX}")
    } else {
        code.to_string()
    }
}

/// The OTC alternative for a `.TW` symbol, if there is one.
pub fn otc_alternative(symbol: &str) -> Option<String> {
    symbol
        .strip_suffix(LISTED_SUFFIX)
        .map(|code| format!("{code}{OTC_SUFFIX}"))
}

/// Resolve a code and fetch its series, retrying `.TW` misses on `.TWO`.
///
/// Only "no data" answers trigger the retry; network and breaker errors are
/// returned as-is. The returned series carries the symbol that answered.
pub fn fetch_with_fallback(
    provider: &dyn MarketDataProvider,
    code: &str,
    period: Period,
) -> Result<PriceSeries, DataError> {
    let symbol = resolve_symbol(code);
    let primary = match provider.fetch_series(&symbol, period) {
        Ok(series) if !series.is_empty() => return Ok(series),
        Ok(_) => DataError::EmptySeries {
            symbol: symbol.clone(),
        },
        Err(e) => e,
    };

    if !primary.is_no_data() {
        return Err(primary);
    }

    let Some(alternative) = otc_alternative(&symbol) else {
        return Err(primary);
    };

    debug!(%symbol, %alternative, "no listed data, trying OTC board");
    match provider.fetch_series(&alternative, period) {
        Ok(series) if !series.is_empty() => Ok(series),
        Ok(_) => Err(primary),
        Err(e) => {
            warn!(%symbol, %alternative, error = %e, "OTC fallback failed");
            if e.is_no_data() {
                Err(primary)
            } else {
                Err(e)
            }
        }
    }
}
