//! twscope core: indicators, scoring and strategy levels for Taiwan equities.
//!
//! This crate holds the deterministic pipeline and its boundaries:
//! - Domain types (bars, price series, fundamentals, look-back periods)
//! - Rolling indicators (MA20, MA60, RSI14, Bollinger 20/2) collected in an `IndicatorFrame`
//! - Rule-table scoring with explainable reasons and action labels
//! - Momentum and value entry/stop/target levels
//! - Candle narrative for the report prompt
//! - Market data providers (Yahoo, synthetic) with TTL caching and `.TWO` fallback
//! - Report prompt builder and the Gemini generator

pub mod data;
pub mod domain;
pub mod indicators;
pub mod levels;
pub mod narrative;
pub mod report;
pub mod scoring;
