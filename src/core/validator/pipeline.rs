use super::{check_params, check_results, check_structure, ResultsByStep, Validator};
use crate::core::error::ValidationError;
use crate::core::resources::Pipeline;
use crate::core::substitution::{pipeline_result_refs, pipeline_task_result_refs, ResultRef};

impl Validator {
    /// Validate a pipeline's schema, then the contracts between its tasks.
    ///
    /// Main and finally tasks are walked as one list. Resolution and parameter
    /// failures stop at the first offending task; result references are only
    /// checked once every task's declared results are known.
    pub async fn validate_pipeline(&self, pipeline: &Pipeline) -> Result<(), ValidationError> {
        check_structure(pipeline)?;

        let mut results = ResultsByStep::new();
        let mut refs_by_step: Vec<(&str, Vec<ResultRef>)> = Vec::new();

        for (index, task) in pipeline.spec.all_tasks().enumerate() {
            tracing::debug!(step = %task.name, index, "validating pipeline task");
            refs_by_step.push((task.name.as_str(), pipeline_task_result_refs(task)));

            let spec = self.resolver.resolve(task).await.map_err(|source| {
                ValidationError::TaskResolution {
                    step: task.name.clone(),
                    source,
                }
            })?;
            results.insert(task.name.clone(), spec.results);

            let findings = check_params(&task.params, &spec.params);
            if !findings.is_empty() {
                return Err(ValidationError::Parameters {
                    step: task.name.clone(),
                    findings,
                });
            }
        }

        for (step, refs) in &refs_by_step {
            check_results(refs, &results).map_err(|source| ValidationError::TaskResults {
                step: step.to_string(),
                source,
            })?;
        }

        let pipeline_refs: Vec<ResultRef> = pipeline
            .spec
            .results
            .iter()
            .flat_map(pipeline_result_refs)
            .collect();
        check_results(&pipeline_refs, &results)
            .map_err(|source| ValidationError::PipelineResults { source })?;

        tracing::debug!(
            pipeline = pipeline.metadata.name.as_deref().unwrap_or_default(),
            "pipeline is valid"
        );
        Ok(())
    }
}
