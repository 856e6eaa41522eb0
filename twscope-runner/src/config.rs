//! Dashboard configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. Sections:
//! - `[data]` cache lifetimes, transport limits, default look-back
//! - `[report]` model endpoint and credential lookup
//! - `[watchlist]` persistence path and the initial codes
//! - `[market]` pulse indices and hot picks

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use twscope_core::data::{CachePolicy, YahooOptions};
use twscope_core::domain::Period;
use twscope_core::report::gemini::{API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use twscope_core::report::GeminiOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A code paired with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSymbol {
    pub code: String,
    pub name: String,
}

impl NamedSymbol {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub series_ttl_secs: u64,
    pub quote_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub breaker_cooldown_secs: u64,
    pub default_period: Period,
    /// Override for the chart/quote API host.
    pub base_url: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            series_ttl_secs: 300,
            quote_ttl_secs: 60,
            request_timeout_secs: 30,
            max_retries: 3,
            breaker_cooldown_secs: 30 * 60,
            default_period: Period::OneYear,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub model: String,
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Inline key; takes precedence over the environment.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: API_KEY_ENV.to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    /// Where the watchlist is persisted. `None` keeps it in memory only.
    pub path: Option<PathBuf>,
    pub defaults: Vec<String>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            path: None,
            defaults: vec!["2330".into(), "2317".into(), "2454".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub indices: Vec<NamedSymbol>,
    pub hot_picks: Vec<NamedSymbol>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            indices: vec![
                NamedSymbol::new("^TWII", "TAIEX"),
                NamedSymbol::new("^IXIC", "Nasdaq"),
                NamedSymbol::new("^SOX", "PHLX Semiconductor"),
            ],
            hot_picks: vec![
                NamedSymbol::new("2330", "TSMC"),
                NamedSymbol::new("2317", "Hon Hai"),
                NamedSymbol::new("2454", "MediaTek"),
                NamedSymbol::new("3231", "Wistron"),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub report: ReportConfig,
    pub watchlist: WatchlistConfig,
    pub market: MarketConfig,
}

impl DashboardConfig {
    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.data;
        for (name, value) in [
            ("data.series_ttl_secs", d.series_ttl_secs),
            ("data.quote_ttl_secs", d.quote_ttl_secs),
            ("data.request_timeout_secs", d.request_timeout_secs),
            ("report.timeout_secs", self.report.timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.market.indices.is_empty() {
            return Err(ConfigError::Invalid("market.indices must not be empty".into()));
        }
        if let Some(bad) = self
            .market
            .indices
            .iter()
            .chain(&self.market.hot_picks)
            .find(|s| s.code.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!("empty code for '{}'", bad.name)));
        }
        if self.report.model.trim().is_empty() {
            return Err(ConfigError::Invalid("report.model must not be empty".into()));
        }
        Ok(())
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            series_max_age: Duration::from_secs(self.data.series_ttl_secs),
            quote_max_age: Duration::from_secs(self.data.quote_ttl_secs),
        }
    }

    pub fn yahoo_options(&self) -> YahooOptions {
        let defaults = YahooOptions::default();
        YahooOptions {
            base_url: self.data.base_url.clone().unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(self.data.request_timeout_secs),
            max_retries: self.data.max_retries,
            base_delay: defaults.base_delay,
        }
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.data.breaker_cooldown_secs)
    }

    /// Gemini settings with the key resolved through `lookup` (normally `std::env::var`).
    pub fn gemini_options(&self, lookup: impl Fn(&str) -> Option<String>) -> GeminiOptions {
        let api_key = self
            .report
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(&self.report.api_key_env));
        GeminiOptions {
            endpoint: self.report.endpoint.clone(),
            model: self.report.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.report.timeout_secs),
        }
    }
}
