//! Typed Tekton resources read from YAML or JSON documents.

pub mod meta;
pub mod param;
pub mod pipeline;
pub mod pipeline_run;
pub mod task;

pub use meta::{ObjectMeta, TypeMeta};
pub use param::{Param, ParamSpec, ParamType, ParamValue, PropertySpec};
pub use pipeline::{
    EmbeddedTask, Matrix, MatrixInclude, Pipeline, PipelineResult, PipelineSpec, PipelineTask,
    TaskRef, WhenExpression,
};
pub use pipeline_run::{PipelineRef, PipelineRun, PipelineRunSpec};
pub use task::{ResultSpec, Step, Task, TaskSpec};

use crate::core::error::DocumentError;

pub const PIPELINE_V1: &str = "tekton.dev/v1/Pipeline";
pub const PIPELINE_RUN_V1: &str = "tekton.dev/v1/PipelineRun";
pub const TASK_V1: &str = "tekton.dev/v1/Task";
pub const TASK_V1BETA1: &str = "tekton.dev/v1beta1/Task";

/// A parsed input document, selected by its `apiVersion`/`kind`.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Pipeline(Pipeline),
    PipelineRun(PipelineRun),
    Task(Task),
}

impl Document {
    /// Read the kind discriminator, then parse the full document.
    pub fn parse(source: &str, data: &[u8]) -> Result<Self, DocumentError> {
        let meta = type_meta(source, data)?;
        let key = meta.key();
        let parse_error = |err: serde_yaml::Error| DocumentError::Parse {
            source_name: source.to_string(),
            key: key.clone(),
            source: err,
        };
        match key.as_str() {
            PIPELINE_V1 => serde_yaml::from_slice(data)
                .map(Document::Pipeline)
                .map_err(parse_error),
            PIPELINE_RUN_V1 => serde_yaml::from_slice(data)
                .map(Document::PipelineRun)
                .map_err(parse_error),
            TASK_V1 | TASK_V1BETA1 => serde_yaml::from_slice(data)
                .map(Document::Task)
                .map_err(parse_error),
            _ => Err(DocumentError::Unsupported { key }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Document::Pipeline(_) => "Pipeline",
            Document::PipelineRun(_) => "PipelineRun",
            Document::Task(_) => "Task",
        }
    }
}

/// Read only the `apiVersion`/`kind` of a document.
pub fn type_meta(source: &str, data: &[u8]) -> Result<TypeMeta, DocumentError> {
    serde_yaml::from_slice(data).map_err(|err| DocumentError::NotAResource {
        source_name: source.to_string(),
        source: err,
    })
}
