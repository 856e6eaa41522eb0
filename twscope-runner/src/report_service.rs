//! Report slot: the narrative report for one analysis, or why it is missing.
//!
//! A report failure never fails the analysis; it becomes an
//! [`ReportSlot::Unavailable`] message shown in place of the text.

use serde::Serialize;
use tracing::{info, warn};

use twscope_core::report::{build_prompt, ReportContext, ReportError, ReportGenerator};

use crate::analysis::StockAnalysis;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum ReportSlot {
    Ready(String),
    Unavailable(String),
}

impl ReportSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReportSlot::Ready(_))
    }

    pub fn text(&self) -> &str {
        match self {
            ReportSlot::Ready(text) | ReportSlot::Unavailable(text) => text,
        }
    }
}

/// Prompt for an analysis, `None` when there is nothing to describe.
pub fn report_prompt(analysis: &StockAnalysis) -> Option<String> {
    ReportContext::from_analysis(
        &analysis.frame,
        &analysis.fundamentals,
        &analysis.score,
        &analysis.narrative,
    )
    .map(|ctx| build_prompt(&ctx))
}

fn unavailable_message(err: &ReportError) -> String {
    match err {
        ReportError::MissingCredential(var) => {
            format!("AI report unavailable: set {var} to enable it")
        }
        other => format!("AI report unavailable: {other}"),
    }
}

pub fn generate_report(generator: &dyn ReportGenerator, analysis: &StockAnalysis) -> ReportSlot {
    let Some(prompt) = report_prompt(analysis) else {
        return ReportSlot::Unavailable("AI report unavailable: no price history".to_string());
    };

    match generator.generate(&prompt) {
        Ok(text) => {
            info!(
                symbol = %analysis.symbol,
                generator = generator.name(),
                chars = text.len(),
                "report generated"
            );
            ReportSlot::Ready(text)
        }
        Err(err) => {
            warn!(symbol = %analysis.symbol, error = %err, "report failed");
            ReportSlot::Unavailable(unavailable_message(&err))
        }
    }
}
