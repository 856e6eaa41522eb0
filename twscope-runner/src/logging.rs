//! Logging setup built on `tracing-subscriber`.
//!
//! Formats:
//! - **pretty**: multi-line, colored, for interactive use
//! - **compact**: one line per event (default)
//! - **json**: one JSON object per event, for piping into other tools
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FORMAT_ENV: &str = "TWSCOPE_LOG_FORMAT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'. Valid: pretty, compact, json")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "warn", "twscope_runner=debug").
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Read the format from `TWSCOPE_LOG_FORMAT`; unknown values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = lookup(LOG_FORMAT_ENV)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        Self {
            format,
            ..Default::default()
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Pretty => registry.with(base.pretty()).try_init()?,
        LogFormat::Compact => registry.with(base.compact()).try_init()?,
        LogFormat::Json => registry.with(base.json()).try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!(" JSON ".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn env_lookup_selects_format() {
        let config = LogConfig::from_lookup(|k| (k == LOG_FORMAT_ENV).then(|| "json".to_string()));
        assert_eq!(config.format, LogFormat::Json);
        let fallback = LogConfig::from_lookup(|_| Some("bogus".to_string()));
        assert_eq!(fallback.format, LogFormat::Compact);
    }

    #[test]
    fn builder_overrides() {
        let config = LogConfig::new("debug").with_format(LogFormat::Pretty);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
