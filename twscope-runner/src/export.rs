//! Export of analysis results: JSON, indicator CSV and a Markdown summary.
//!
//! `save_analysis` writes all three (plus the report text when present) into
//! one directory per run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use twscope_core::indicators::IndicatorFrame;
use twscope_core::levels::PriceLevels;

use crate::analysis::StockAnalysis;
use crate::report_service::ReportSlot;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(analysis: &StockAnalysis) -> Result<String> {
    serde_json::to_string_pretty(analysis).context("failed to serialize analysis to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Indicator frame as CSV. Undefined indicator values are empty cells.
///
/// Columns: date, open, high, low, close, volume, ma20, ma60, rsi14,
/// bb_mid, bb_upper, bb_lower
pub fn export_frame_csv(frame: &IndicatorFrame) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date", "open", "high", "low", "close", "volume", "ma20", "ma60", "rsi14", "bb_mid",
        "bb_upper", "bb_lower",
    ])?;

    for row in frame.rows() {
        wtr.write_record([
            row.date.to_string(),
            format!("{:.6}", row.open),
            format!("{:.6}", row.high),
            format!("{:.6}", row.low),
            format!("{:.6}", row.close),
            row.volume.to_string(),
            cell(row.ma20),
            cell(row.ma60),
            cell(row.rsi14),
            cell(row.bb_mid),
            cell(row.bb_upper),
            cell(row.bb_lower),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown summary ───────────────────────────────────────────────

fn or_dash(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}{suffix}"))
}

fn levels_row(name: &str, levels: &PriceLevels) -> String {
    format!(
        "| {name} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
        levels.entry,
        levels.stop,
        levels.profit_target,
        levels.reward_risk()
    )
}

pub fn generate_markdown(analysis: &StockAnalysis, report: Option<&ReportSlot>) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# {} ({})\n\n", analysis.name, analysis.symbol));

    md.push_str("## Quote\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Last | {:.2} |\n", analysis.last.close));
    md.push_str(&format!("| Change | {} |\n", or_dash(analysis.change_pct, "%")));
    md.push_str(&format!("| Date | {} |\n", analysis.last.date));
    md.push_str(&format!("| Period | {} ({} bars) |\n", analysis.period, analysis.bars));
    md.push_str(&format!("| Fingerprint | {} |\n", analysis.fingerprint));
    md.push('\n');

    md.push_str("## Score\n\n");
    md.push_str(&format!(
        "**{}** / 100, {}\n\n",
        analysis.score.score,
        analysis.score.action.label()
    ));
    if analysis.score.reasons.is_empty() {
        md.push_str("No rule fired.\n\n");
    } else {
        for reason in &analysis.score.reasons {
            md.push_str(&format!("- {reason}\n"));
        }
        md.push('\n');
    }

    md.push_str("## Levels\n\n");
    md.push_str("| Strategy | Entry | Stop | Target | Reward/Risk |\n");
    md.push_str("| --- | --- | --- | --- | --- |\n");
    md.push_str(&levels_row("Momentum", &analysis.levels.momentum));
    md.push_str(&levels_row("Value", &analysis.levels.value));
    md.push('\n');

    let m = &analysis.metrics;
    md.push_str("## Details\n\n");
    md.push_str(&format!("- RSI(14): {}\n", or_dash(m.rsi14, "")));
    md.push_str(&format!("- Volume: {:.0} lots\n", m.volume_lots));
    md.push_str(&format!("- P/E: {}\n", or_dash(m.trailing_pe, "")));
    md.push_str(&format!("- ROE: {}\n", or_dash(m.roe_percent, "%")));
    md.push_str(&format!("- Recent bars: {}\n", analysis.narrative));

    if let Some(slot) = report {
        md.push_str("\n## AI Report\n\n");
        md.push_str(slot.text());
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save an analysis under `{output_dir}/{symbol}_{timestamp}/`:
/// - `analysis.json`
/// - `indicators.csv`
/// - `summary.md`
/// - `report.md` when the report is ready
///
/// Returns the created directory.
pub fn save_analysis(
    analysis: &StockAnalysis,
    report: Option<&ReportSlot>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        analysis.symbol.replace('^', ""),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create export dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("analysis.json"), export_json(analysis)?)?;
    std::fs::write(run_dir.join("indicators.csv"), export_frame_csv(&analysis.frame)?)?;
    std::fs::write(run_dir.join("summary.md"), generate_markdown(analysis, report))?;
    if let Some(ReportSlot::Ready(text)) = report {
        std::fs::write(run_dir.join("report.md"), text)?;
    }

    Ok(run_dir)
}
