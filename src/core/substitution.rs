//! Variable substitution scanning: `$(...)` expressions and task result references.

use crate::core::resources::{PipelineResult, PipelineTask};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

fn expression_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\(([^()]+)\)").expect("valid expression regex"))
}

fn result_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^tasks\.(?P<task>[^.\[\]]+)\.results",
            r"(?:\.(?P<dotted>[^.\[\]]+)|\[(?:'(?P<single>[^']+)'|\x22(?P<double>[^\x22]+)\x22)\])",
            r"(?:\[(?P<index>\d+|\*)\]|\.(?P<property>[^.\[\]]+))?$"
        ))
        .expect("valid result reference regex")
    })
}

/// Optional selector following the result name in a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResultSelector {
    /// `[*]`
    All,
    /// `[n]`
    Index(usize),
    /// `.key` on an object result
    Property(String),
}

/// Reference from a pipeline task (or the pipeline) to another task's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRef {
    pub pipeline_task: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<ResultSelector>,
}

impl ResultRef {
    pub fn new(pipeline_task: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            pipeline_task: pipeline_task.into(),
            result: result.into(),
            selector: None,
        }
    }

    /// Parse the inside of a `$(...)` expression as a result reference.
    pub fn parse(expression: &str) -> Option<Self> {
        let caps = result_ref_regex().captures(expression.trim())?;
        let result = caps
            .name("dotted")
            .or_else(|| caps.name("single"))
            .or_else(|| caps.name("double"))?
            .as_str();
        let selector = if let Some(index) = caps.name("index") {
            match index.as_str() {
                "*" => Some(ResultSelector::All),
                n => n.parse().ok().map(ResultSelector::Index),
            }
        } else {
            caps.name("property")
                .map(|property| ResultSelector::Property(property.as_str().to_string()))
        };
        Some(Self {
            pipeline_task: caps["task"].to_string(),
            result: result.to_string(),
            selector,
        })
    }
}

impl fmt::Display for ResultRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$(tasks.{}.results.{}", self.pipeline_task, self.result)?;
        match &self.selector {
            Some(ResultSelector::All) => write!(f, "[*])"),
            Some(ResultSelector::Index(i)) => write!(f, "[{}])", i),
            Some(ResultSelector::Property(p)) => write!(f, ".{})", p),
            None => write!(f, ")"),
        }
    }
}

/// Inner text of every `$(...)` expression in `input`.
pub fn extract_expressions(input: &str) -> Vec<&str> {
    expression_regex()
        .captures_iter(input)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Result references found in the given strings, in order.
pub fn result_refs_in<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<ResultRef> {
    values
        .into_iter()
        .flat_map(extract_expressions)
        .filter_map(ResultRef::parse)
        .collect()
}

/// Result references consumed by a pipeline task: params, when expressions and matrix params.
pub fn pipeline_task_result_refs(task: &PipelineTask) -> Vec<ResultRef> {
    let mut strings: Vec<&str> = Vec::new();
    for param in &task.params {
        if let Some(value) = &param.value {
            strings.extend(value.strings());
        }
    }
    for when in &task.when {
        strings.extend(when.strings());
    }
    if let Some(matrix) = &task.matrix {
        let include_params = matrix.include.iter().flat_map(|include| include.params.iter());
        for param in matrix.params.iter().chain(include_params) {
            if let Some(value) = &param.value {
                strings.extend(value.strings());
            }
        }
    }
    result_refs_in(strings)
}

/// Result references in a pipeline-level result value.
pub fn pipeline_result_refs(result: &PipelineResult) -> Vec<ResultRef> {
    match &result.value {
        Some(value) => result_refs_in(value.strings()),
        None => Vec::new(),
    }
}
