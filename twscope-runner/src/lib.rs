//! twscope runner: dashboard orchestration on top of `twscope-core`.
//!
//! This crate wires the core pipeline into the commands the CLI exposes:
//! - TOML configuration and logging setup
//! - Single-symbol analysis (fetch with `.TWO` fallback, score, levels, details)
//! - Parallel batch scanner, market pulse and hot picks
//! - Report slot around the narrative generator
//! - Watchlist state, JSON persistence and analysis export

pub mod analysis;
pub mod config;
pub mod export;
pub mod logging;
pub mod persistence;
pub mod pulse;
pub mod report_service;
pub mod scanner;
pub mod state;

pub use analysis::{analyze_series, analyze_symbol, AnalysisError, DetailMetrics, StockAnalysis};
pub use config::{ConfigError, DashboardConfig, NamedSymbol};
pub use export::{export_frame_csv, export_json, generate_markdown, save_analysis};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use persistence::{load_state, save_state};
pub use pulse::{hot_picks, market_pulse, LabeledOutcome};
pub use report_service::{generate_report, report_prompt, ReportSlot};
pub use scanner::{fast_score, BatchScanner, Quote, ScanOutcome, ScanReport, SCAN_PERIOD};
pub use state::{AppState, StateError, View, Watchlist};
