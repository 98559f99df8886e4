use super::pipeline::{validate_pipeline_spec, validate_unique_params};
use super::{validate_object_meta, via, FieldError, StructuralValidate};
use crate::core::resources::PipelineRun;

impl StructuralValidate for PipelineRun {
    fn validate_structure(&self) -> Vec<FieldError> {
        let mut errors = via(validate_object_meta(&self.metadata, true), "metadata");
        let spec = &self.spec;
        match (&spec.pipeline_ref, &spec.pipeline_spec) {
            (Some(_), Some(_)) => errors.push(
                FieldError::multiple_one_of(&["pipelineRef", "pipelineSpec"]).via("spec"),
            ),
            (None, None) => errors.push(
                FieldError::missing_one_of(&["pipelineRef", "pipelineSpec"]).via("spec"),
            ),
            (Some(pipeline_ref), None) => {
                let set = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
                match (set(&pipeline_ref.name), set(&pipeline_ref.resolver)) {
                    (true, true) => errors.push(
                        FieldError::multiple_one_of(&["name", "resolver"]).via("spec.pipelineRef"),
                    ),
                    (false, false) => {
                        errors.push(FieldError::missing_field("spec.pipelineRef.name"))
                    }
                    _ => {}
                }
            }
            (None, Some(pipeline_spec)) => {
                errors.extend(via(validate_pipeline_spec(pipeline_spec), "spec.pipelineSpec"));
            }
        }
        errors.extend(via(validate_unique_params(&spec.params), "spec.params"));
        errors
    }
}
