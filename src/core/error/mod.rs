use crate::core::bundle::FetchError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Broad class of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Structural,
    TaskResolution,
    Parameter,
    ResultReference,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Structural => "structural",
            ErrorCategory::TaskResolution => "task_resolution",
            ErrorCategory::Parameter => "parameter",
            ErrorCategory::ResultReference => "result_reference",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parameter contract violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamFinding {
    #[error("{name:?} parameter is not defined by the Task")]
    UndeclaredParameter { name: String },
    #[error("{name:?} parameter has the incorrect type, got {got:?}, want {want:?}")]
    TypeMismatch {
        name: String,
        got: String,
        want: String,
    },
    #[error("{name:?} parameter is required")]
    MissingRequiredParameter { name: String },
}

/// Ordered list of parameter findings for one pipeline task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamFindings(Vec<ParamFinding>);

impl ParamFindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: ParamFinding) {
        self.0.push(finding);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParamFinding> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<ParamFinding> {
        self.0
    }
}

impl From<Vec<ParamFinding>> for ParamFindings {
    fn from(findings: Vec<ParamFinding>) -> Self {
        Self(findings)
    }
}

impl fmt::Display for ParamFindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, finding) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  * {}", finding)?;
        }
        Ok(())
    }
}

/// A result reference that does not point at a declared result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResultRefError {
    #[error("{result} result from non-existent {step} pipeline task")]
    UnknownProducerStep { step: String, result: String },
    #[error("non-existent {result} result from {step} pipeline task")]
    UnknownResult { step: String, result: String },
}

/// Failure to obtain the task spec behind a pipeline task.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unable to retrieve spec for pipeline task")]
    UnresolvableTaskSpec,
    #[error("custom Tasks are not supported")]
    UnsupportedTaskKind,
    #[error("fetching bundle entry: {0}")]
    BundleFetch(#[from] FetchError),
    #[error("parsing bundle entry as a Task: {0}")]
    MalformedTaskDocument(#[source] serde_yaml::Error),
}

/// Outcome of a failed validation call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", .errors.join("\n"))]
    Structural { errors: Vec<String> },
    #[error("retrieving task spec from {step} pipeline task: {source}")]
    TaskResolution {
        step: String,
        #[source]
        source: ResolveError,
    },
    #[error("{step} pipeline task parameters:\n{findings}")]
    Parameters {
        step: String,
        findings: ParamFindings,
    },
    #[error("{step} pipeline task results: {source}")]
    TaskResults {
        step: String,
        #[source]
        source: ResultRefError,
    },
    #[error("pipeline results: {source}")]
    PipelineResults {
        #[source]
        source: ResultRefError,
    },
}

impl ValidationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::Structural { .. } => ErrorCategory::Structural,
            ValidationError::TaskResolution { .. } => ErrorCategory::TaskResolution,
            ValidationError::Parameters { .. } => ErrorCategory::Parameter,
            ValidationError::TaskResults { .. } | ValidationError::PipelineResults { .. } => {
                ErrorCategory::ResultReference
            }
        }
    }

    /// Stable identifier used by machine-readable reports.
    pub fn code(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Structural => "TKR-STRUCT-001",
            ErrorCategory::TaskResolution => "TKR-TASK-001",
            ErrorCategory::Parameter => "TKR-PARAM-001",
            ErrorCategory::ResultReference => "TKR-RESULT-001",
        }
    }

    /// Name of the pipeline task the failure is scoped to, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            ValidationError::TaskResolution { step, .. }
            | ValidationError::Parameters { step, .. }
            | ValidationError::TaskResults { step, .. } => Some(step.as_str()),
            ValidationError::Structural { .. } | ValidationError::PipelineResults { .. } => None,
        }
    }
}

/// Failure to read or recognise an input document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unmarshaling {source_name} as k8s resource: {source}")]
    NotAResource {
        source_name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unmarshalling {source_name} as {key}: {source}")]
    Parse {
        source_name: String,
        key: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{key} is not supported")]
    Unsupported { key: String },
}

pub trait ErrorReporter {
    fn report_error(&self, error: &ValidationError);
}

/// Reporter writing failures to stderr.
pub struct DefaultErrorReporter;

impl DefaultErrorReporter {
    pub fn new() -> Self {
        DefaultErrorReporter
    }
}

impl Default for DefaultErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter for DefaultErrorReporter {
    fn report_error(&self, error: &ValidationError) {
        eprintln!("{}", error);
    }
}
