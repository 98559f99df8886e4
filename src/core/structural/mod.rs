//! Single-resource schema rules.
//!
//! Each resource reports every [`FieldError`] it finds; the contract validator
//! only consumes the list through [`StructuralValidate`] and renders it with
//! [`format_field_errors`].

mod pipeline;
mod pipeline_run;
mod task;

pub use pipeline::validate_pipeline_spec;

use crate::core::resources::{ObjectMeta, ParamSpec, ParamType, ResultSpec};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const MAX_NAME_LENGTH: usize = 63;

/// A field-level violation: a message, the offending paths and optional details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub message: String,
    pub paths: Vec<String>,
    pub details: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            message: message.into(),
            paths,
            details: String::new(),
        }
    }

    pub fn missing_field(path: impl Into<String>) -> Self {
        Self::new("missing field(s)", vec![path.into()])
    }

    pub fn multiple_one_of(paths: &[&str]) -> Self {
        Self::new(
            "expected exactly one, got both",
            paths.iter().map(|p| p.to_string()).collect(),
        )
    }

    pub fn missing_one_of(paths: &[&str]) -> Self {
        Self::new(
            "expected exactly one, got neither",
            paths.iter().map(|p| p.to_string()).collect(),
        )
    }

    pub fn invalid_value(value: impl std::fmt::Display, path: impl Into<String>) -> Self {
        Self::new(format!("invalid value: {}", value), vec![path.into()])
    }

    pub fn disallowed_field(path: impl Into<String>) -> Self {
        Self::new("must not set the field(s)", vec![path.into()])
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Prefix every path with `prefix`, the way nested fields are reported.
    pub fn via(mut self, prefix: &str) -> Self {
        self.paths = self
            .paths
            .into_iter()
            .map(|path| join_path(prefix, &path))
            .collect();
        self
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        prefix.to_string()
    } else if prefix.is_empty() {
        path.to_string()
    } else if path.starts_with('[') {
        format!("{}{}", prefix, path)
    } else {
        format!("{}.{}", prefix, path)
    }
}

/// Prefix all errors of a nested validation.
pub(crate) fn via(errors: Vec<FieldError>, prefix: &str) -> Vec<FieldError> {
    errors.into_iter().map(|e| e.via(prefix)).collect()
}

/// Schema validation of one resource in isolation.
pub trait StructuralValidate {
    fn validate_structure(&self) -> Vec<FieldError>;
}

/// Render field errors one line per offending path.
///
/// Lines read `<message>: <path> <details>`; an error without paths becomes
/// `<message>: <details>`.
pub fn format_field_errors(errors: &[FieldError]) -> Vec<String> {
    let mut lines = Vec::new();
    for error in errors {
        let message = error.message.trim_end_matches(": ");
        let details = if error.details.is_empty() {
            String::new()
        } else {
            format!(" {}", error.details)
        };
        for path in &error.paths {
            lines.push(format!("{}: {}{}", message, path, details));
        }
        if error.paths.is_empty() {
            lines.push(format!("{}: {}", message, error.details));
        }
    }
    lines
}

/// DNS-1123 label: lowercase alphanumerics and '-', starting and ending alphanumeric.
pub(crate) fn is_dns_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    !bytes.is_empty()
        && bytes.len() <= MAX_NAME_LENGTH
        && bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum)
        && bytes.iter().all(|b| alnum(b) || *b == b'-')
}

fn result_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid result name regex")
    })
}

pub(crate) fn validate_object_meta(meta: &ObjectMeta, allow_generate_name: bool) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let name = meta.name.as_deref().unwrap_or_default();
    if name.is_empty() {
        let generated = meta.generate_name.as_deref().is_some_and(|g| !g.is_empty());
        if allow_generate_name && !generated {
            errors.push(FieldError::missing_one_of(&["generateName", "name"]));
        } else if !allow_generate_name {
            errors.push(FieldError::missing_field("name"));
        }
        return errors;
    }
    if name.contains('.') {
        errors.push(FieldError::new(
            "Invalid resource name: special character . must not be present",
            vec!["name".to_string()],
        ));
    }
    if name.len() > MAX_NAME_LENGTH {
        errors.push(FieldError::new(
            format!(
                "Invalid resource name: length must be no more than {} characters",
                MAX_NAME_LENGTH
            ),
            vec!["name".to_string()],
        ));
    }
    errors
}

/// Rules shared by task and pipeline parameter declarations. Paths are relative to `params`.
pub(crate) fn validate_param_specs(specs: &[ParamSpec]) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (i, spec) in specs.iter().enumerate() {
        if spec.name.is_empty() {
            errors.push(FieldError::missing_field(format!("[{}].name", i)));
            continue;
        }
        if !seen.insert(spec.name.as_str()) {
            errors.push(FieldError::new(
                "parameter appears more than once",
                vec![format!("[{}]", spec.name)],
            ));
        }
        let declared = spec.declared_type();
        if let Some(default) = &spec.default {
            let default_type = default.param_type();
            if default_type != declared {
                errors.push(FieldError::new(
                    format!(
                        "{:?} type does not match default value's type: {:?}",
                        declared.as_str(),
                        default_type.as_str()
                    ),
                    vec![
                        format!("{}.type", spec.name),
                        format!("{}.default.type", spec.name),
                    ],
                ));
            }
        }
        if declared == ParamType::Object && spec.properties.is_empty() {
            errors.push(FieldError::missing_field(format!("{}.properties", spec.name)));
        }
    }
    errors
}

/// Result name rules. Paths are relative to `results`.
pub(crate) fn validate_result_specs(results: &[ResultSpec]) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (i, result) in results.iter().enumerate() {
        if result.name.is_empty() {
            errors.push(FieldError::missing_field(format!("[{}].name", i)));
            continue;
        }
        if !result_name_regex().is_match(&result.name) {
            errors.push(
                FieldError::invalid_value(&result.name, format!("[{}].name", i)).with_details(
                    "Name must consist of alphanumeric characters, '-', '_', '.', and must start and end with an alphanumeric character",
                ),
            );
        }
        if !seen.insert(result.name.as_str()) {
            errors.push(FieldError::new(
                "result appears more than once",
                vec![format!("[{}]", result.name)],
            ));
        }
    }
    errors
}
