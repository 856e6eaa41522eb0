//! Narrative report boundary.
//!
//! The prompt is built from plain analysis data; the generator behind the
//! [`ReportGenerator`] trait is the only part that talks to a model endpoint.

pub mod gemini;
pub mod prompt;

pub use gemini::{GeminiClient, GeminiOptions};
pub use prompt::{build_prompt, ReportContext, CONTEXT_BARS, REPORT_SECTIONS};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportError {
    #[error("report credential missing: set {0}")]
    MissingCredential(String),

    #[error("report request failed: {0}")]
    Http(String),

    #[error("report service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("report service returned no text")]
    EmptyResponse,
}

/// Turns a prompt into report text.
pub trait ReportGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str) -> Result<String, ReportError>;
}

impl<G: ReportGenerator + ?Sized> ReportGenerator for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, prompt: &str) -> Result<String, ReportError> {
        (**self).generate(prompt)
    }
}
