use super::{check_structure, Validator};
use crate::core::error::ValidationError;
use crate::core::resources::{ObjectMeta, Pipeline, PipelineRun};

/// Name given to the pipeline synthesized from an embedded spec.
pub const EMBEDDED_PIPELINE_NAME: &str = "noname";

impl Validator {
    /// Validate a run's schema and, when it embeds a pipeline, that pipeline.
    ///
    /// Runs that reference a pipeline by name are not followed.
    pub async fn validate_pipeline_run(&self, run: &PipelineRun) -> Result<(), ValidationError> {
        check_structure(run)?;

        let Some(spec) = &run.spec.pipeline_spec else {
            tracing::debug!("pipeline run references its pipeline, nothing else to check");
            return Ok(());
        };
        let pipeline = Pipeline {
            api_version: "tekton.dev/v1".to_string(),
            kind: "Pipeline".to_string(),
            metadata: ObjectMeta::named(EMBEDDED_PIPELINE_NAME),
            spec: spec.clone(),
        };
        self.validate_pipeline(&pipeline).await
    }
}
