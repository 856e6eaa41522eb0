//! Report prompt: quantitative context block plus fixed output sections.

use serde::Serialize;

use crate::domain::{change_pct, Fundamentals};
use crate::indicators::IndicatorFrame;
use crate::scoring::{Action, ScoreResult};

/// Bars considered for the recent range and the cost basis (about one quarter).
pub const CONTEXT_BARS: usize = 60;

/// Output sections the model must produce, in order.
pub const REPORT_SECTIONS: [&str; 5] = [
    "Decision Dashboard",
    "Win Rate and Payoff",
    "Risk Analysis",
    "Multi-Factor Analysis",
    "Scenario Plan",
];

/// Everything the prompt needs, already derived from the analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContext {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub score: u8,
    pub action: Action,
    pub recent_high: f64,
    pub recent_low: f64,
    /// Close of the highest-volume bar in the context window.
    pub cost_basis: f64,
    /// Percent deviation of the last close from the cost basis.
    pub cost_bias_pct: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub roe_percent: Option<f64>,
    pub narrative: String,
}

impl ReportContext {
    /// `None` for an empty frame.
    pub fn from_analysis(
        frame: &IndicatorFrame,
        fundamentals: &Fundamentals,
        score: &ScoreResult,
        narrative: &str,
    ) -> Option<Self> {
        let symbol = frame.series().symbol();
        let window = frame.series().tail(CONTEXT_BARS);
        let last = window.last()?;

        let recent_high = window.iter().map(|b| b.close).fold(f64::NEG_INFINITY, f64::max);
        let recent_low = window.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);

        // First bar wins ties.
        let heaviest = window
            .iter()
            .reduce(|best, b| if b.volume > best.volume { b } else { best })?;

        let name = fundamentals
            .long_name
            .as_deref()
            .or_else(|| frame.series().display_name())
            .unwrap_or(symbol)
            .to_string();

        Some(Self {
            name,
            symbol: symbol.to_string(),
            price: last.close,
            score: score.score,
            action: score.action,
            recent_high,
            recent_low,
            cost_basis: heaviest.close,
            cost_bias_pct: change_pct(heaviest.close, last.close),
            trailing_pe: fundamentals.trailing_pe,
            roe_percent: fundamentals.roe_percent(),
            narrative: narrative.to_string(),
        })
    }
}

fn or_na(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}{suffix}"))
}

/// Render the full prompt text.
pub fn build_prompt(ctx: &ReportContext) -> String {
    let mut out = String::new();
    out.push_str(
        "Role: you are a strictly rational hedge-fund manager who reasons in probabilities and expected value.\n\n",
    );

    out.push_str("[Quantitative dashboard]\n");
    out.push_str(&format!("- Instrument: {} ({})\n", ctx.name, ctx.symbol));
    out.push_str(&format!("- Last price: {:.2}\n", ctx.price));
    out.push_str(&format!(
        "- Composite score: {} (rule-based action: {})\n\n",
        ctx.score, ctx.action
    ));

    out.push_str("[Candle narrative]\n");
    out.push_str(&format!("- Recent bars: {}\n\n", ctx.narrative));

    out.push_str("[Key levels]\n");
    out.push_str(&format!(
        "- {CONTEXT_BARS}-bar high: {:.2} | {CONTEXT_BARS}-bar low: {:.2}\n",
        ctx.recent_high, ctx.recent_low
    ));
    out.push_str(&format!(
        "- Volume-weighted cost basis (close of the heaviest-volume bar): {:.2} (current deviation: {})\n\n",
        ctx.cost_basis,
        or_na(ctx.cost_bias_pct, "%")
    ));

    out.push_str("[Fundamentals]\n");
    out.push_str(&format!(
        "- P/E: {} | ROE: {}\n\n",
        or_na(ctx.trailing_pe, ""),
        or_na(ctx.roe_percent, "%")
    ));

    out.push_str("Tasks:\n");
    out.push_str("1. Diagnose the instrument across technicals and fundamentals.\n");
    out.push_str("2. Look for divergences between the signals above.\n");
    out.push_str("3. Estimate the win rate and the payoff ratio.\n\n");

    out.push_str("Answer with exactly these sections:\n");
    for (i, section) in REPORT_SECTIONS.iter().enumerate() {
        out.push_str(&format!("{}. [{section}]\n", i + 1));
    }
    out
}
