use crate::core::error::{ErrorCategory, ValidationError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per failure, or `<file> is valid`
    Text,
    /// Pretty-printed JSON report
    Json,
}

/// One reported failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub code: &'static str,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub message: String,
}

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub file: String,
    pub kind: String,
    pub valid: bool,
    pub errors: Vec<ReportEntry>,
}

impl ValidationReport {
    /// Structural failures contribute one entry per line; every other failure is a single entry.
    pub fn new(
        file: impl Into<String>,
        kind: impl Into<String>,
        outcome: &Result<(), ValidationError>,
    ) -> Self {
        let errors = match outcome {
            Ok(()) => Vec::new(),
            Err(error @ ValidationError::Structural { errors }) => errors
                .iter()
                .map(|line| ReportEntry {
                    code: error.code(),
                    category: error.category(),
                    step: None,
                    message: line.clone(),
                })
                .collect(),
            Err(error) => vec![ReportEntry {
                code: error.code(),
                category: error.category(),
                step: error.step().map(str::to_string),
                message: error.to_string(),
            }],
        };
        Self {
            file: file.into(),
            kind: kind.into(),
            valid: outcome.is_ok(),
            errors,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        if self.valid {
            return format!("{} is valid", self.file);
        }
        self.errors
            .iter()
            .map(|entry| entry.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
