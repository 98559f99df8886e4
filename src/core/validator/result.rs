use crate::core::error::ResultRefError;
use crate::core::resources::ResultSpec;
use crate::core::substitution::ResultRef;
use std::collections::HashMap;

/// Declared results of every pipeline task, keyed by pipeline task name.
pub type ResultsByStep = HashMap<String, Vec<ResultSpec>>;

/// Check that each reference names a known pipeline task and one of its declared results.
///
/// Stops at the first bad reference. Result types are not compared.
pub fn check_results(refs: &[ResultRef], results: &ResultsByStep) -> Result<(), ResultRefError> {
    for reference in refs {
        let Some(declared) = results.get(&reference.pipeline_task) else {
            return Err(ResultRefError::UnknownProducerStep {
                step: reference.pipeline_task.clone(),
                result: reference.result.clone(),
            });
        };
        if !declared.iter().any(|spec| spec.name == reference.result) {
            return Err(ResultRefError::UnknownResult {
                step: reference.pipeline_task.clone(),
                result: reference.result.clone(),
            });
        }
    }
    Ok(())
}
