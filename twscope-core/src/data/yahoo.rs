//! Yahoo Finance data provider.
//!
//! Daily bars come from the v8 chart API (`range` + `interval=1d`), fundamentals
//! from the v10 quoteSummary API. Both go through the same retry/backoff loop.
//!
//! Series requests own the caller's circuit breaker. Fundamentals use a
//! separate breaker so a failing quoteSummary endpoint never blocks bars; they
//! still honour the series breaker when it is open.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Bar, Fundamentals, Period, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryModules>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    financial_data: Option<FinancialData>,
    summary_detail: Option<SummaryDetail>,
    price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    return_on_equity: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
}

/// Yahoo wraps numbers as `{"raw": 0.27, "fmt": "27.00%"}`; empty objects are common.
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

/// Transport settings for [`YahooProvider`].
#[derive(Debug, Clone)]
pub struct YahooOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for YahooOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    summary_breaker: CircuitBreaker,
    options: YahooOptions,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, options: YahooOptions) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            summary_breaker: circuit_breaker.sibling(),
            circuit_breaker,
            options,
        })
    }

    fn chart_url(&self, symbol: &str, period: Period) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}?range={}&interval=1d",
            self.options.base_url.trim_end_matches('/'),
            period.as_str()
        )
    }

    fn summary_url(&self, symbol: &str) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{symbol}?modules=financialData,summaryDetail,price",
            self.options.base_url.trim_end_matches('/')
        )
    }

    /// GET a JSON document with retry and circuit breaker logic.
    ///
    /// Only 429, 5xx and transport timeouts are retried and counted against
    /// `breaker`; other 4xx answers return at once.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        symbol: &str,
        breaker: &CircuitBreaker,
    ) -> Result<T, DataError> {
        if !breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = self.options.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                // IP ban: stop talking to Yahoo for the cooldown, on every endpoint
                breaker.trip();
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if status.is_client_error() {
                return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
            }

            if !status.is_success() {
                breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let body = resp.text().map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
            let parsed = serde_json::from_str(&body).map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;
            breaker.record_success();
            return Ok(parsed);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Parse a chart API document into a series.
///
/// Rows without a close are dropped (holidays, halted sessions). Missing
/// open/high/low fall back to the close; missing volume is zero.
pub fn parse_chart(symbol: &str, json: &str) -> Result<PriceSeries, DataError> {
    let resp: ChartResponse = serde_json::from_str(json)
        .map_err(|e| DataError::ResponseFormatChanged(format!("chart for {symbol}: {e}")))?;
    chart_to_series(symbol, resp)
}

fn api_error(symbol: &str, err: Option<ApiError>) -> DataError {
    match err {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    }
}

fn chart_to_series(symbol: &str, resp: ChartResponse) -> Result<PriceSeries, DataError> {
    let ChartResult { result, error } = resp.chart;
    let data = result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| api_error(symbol, error))?;

    let meta = data.meta.unwrap_or_default();
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next();

    let mut bars = Vec::with_capacity(timestamps.len());
    if let Some(quote) = quote {
        for (i, &ts) in timestamps.iter().enumerate() {
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let date = exchange_date(ts, meta.gmtoffset)?;
            let pick = |column: &[Option<f64>]| column.get(i).copied().flatten().unwrap_or(close);
            bars.push(Bar {
                date,
                open: pick(&quote.open),
                high: pick(&quote.high),
                low: pick(&quote.low),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }
    }

    if bars.is_empty() {
        return Err(DataError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    // Yahoo occasionally repeats the live bar with the same session date.
    bars.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            *earlier = *later;
            true
        } else {
            false
        }
    });

    let name = meta.long_name.or(meta.short_name);
    Ok(PriceSeries::new(symbol, bars)?.with_display_name(name))
}

/// Session date in the exchange's own time zone.
fn exchange_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate, DataError> {
    chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))
}

/// Parse a quoteSummary document into fundamentals.
pub fn parse_summary(symbol: &str, json: &str) -> Result<Fundamentals, DataError> {
    let resp: SummaryResponse = serde_json::from_str(json)
        .map_err(|e| DataError::ResponseFormatChanged(format!("summary for {symbol}: {e}")))?;
    summary_to_fundamentals(symbol, resp)
}

fn summary_to_fundamentals(symbol: &str, resp: SummaryResponse) -> Result<Fundamentals, DataError> {
    let SummaryResult { result, error } = resp.quote_summary;
    let modules = result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| api_error(symbol, error))?;

    Ok(Fundamentals {
        trailing_pe: raw(modules.summary_detail.and_then(|d| d.trailing_pe)),
        return_on_equity: raw(modules.financial_data.and_then(|f| f.return_on_equity)),
        long_name: modules
            .price
            .and_then(|p| p.long_name)
            .filter(|n| !n.trim().is_empty()),
    })
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_series(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError> {
        let url = self.chart_url(symbol, period);
        debug!(symbol, %period, "fetching chart");
        let resp: ChartResponse = self.get_json(&url, symbol, &self.circuit_breaker)?;
        chart_to_series(symbol, resp)
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals {
        if !self.circuit_breaker.is_allowed() {
            return Fundamentals::default();
        }
        let url = self.summary_url(symbol);
        let result = self
            .get_json::<SummaryResponse>(&url, symbol, &self.summary_breaker)
            .and_then(|resp| summary_to_fundamentals(symbol, resp));
        match result {
            Ok(fundamentals) => fundamentals,
            Err(e) => {
                warn!(symbol, error = %e, "fundamentals unavailable");
                Fundamentals::default()
            }
        }
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
