//! Cross-resource contract validation of Pipelines and PipelineRuns.

pub mod parameter;
pub mod pipeline;
pub mod pipeline_run;
pub mod result;
pub mod task;

pub use parameter::check_params;
pub use result::{check_results, ResultsByStep};
pub use task::{bundle_resolver_params, TaskSpecResolver, BUNDLES_RESOLVER, DEFAULT_SERVICE_ACCOUNT};

use crate::core::bundle::BundleFetcher;
use crate::core::error::ValidationError;
use crate::core::resources::{Document, Task};
use crate::core::structural::{format_field_errors, StructuralValidate};
use std::sync::Arc;

/// Validates parsed documents. Holds no state between calls.
pub struct Validator {
    resolver: TaskSpecResolver,
}

impl Validator {
    pub fn new(fetcher: Arc<dyn BundleFetcher>) -> Self {
        Self {
            resolver: TaskSpecResolver::new(fetcher),
        }
    }

    /// Service account injected into bundle references that do not name one.
    pub fn with_default_service_account(mut self, service_account: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_default_service_account(service_account);
        self
    }

    pub async fn validate_document(&self, document: &Document) -> Result<(), ValidationError> {
        match document {
            Document::Pipeline(pipeline) => self.validate_pipeline(pipeline).await,
            Document::PipelineRun(run) => self.validate_pipeline_run(run).await,
            Document::Task(task) => self.validate_task(task),
        }
    }

    /// Tasks have no cross-resource contracts; only their schema is checked.
    pub fn validate_task(&self, task: &Task) -> Result<(), ValidationError> {
        check_structure(task)
    }
}

/// Run structural validation and turn any field errors into one aggregate error.
pub(crate) fn check_structure<R: StructuralValidate>(resource: &R) -> Result<(), ValidationError> {
    let errors = resource.validate_structure();
    if errors.is_empty() {
        return Ok(());
    }
    Err(ValidationError::Structural {
        errors: format_field_errors(&errors),
    })
}
