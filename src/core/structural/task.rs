use super::{
    is_dns_label, validate_object_meta, validate_param_specs, validate_result_specs, via,
    FieldError, StructuralValidate,
};
use crate::core::resources::{Task, TaskSpec};
use std::collections::HashSet;

impl StructuralValidate for Task {
    fn validate_structure(&self) -> Vec<FieldError> {
        let mut errors = via(validate_object_meta(&self.metadata, false), "metadata");
        errors.extend(via(validate_task_spec(&self.spec), "spec"));
        errors
    }
}

fn validate_task_spec(spec: &TaskSpec) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if spec.steps.is_empty() {
        errors.push(FieldError::missing_field("steps"));
    }

    let mut names = HashSet::new();
    for (i, step) in spec.steps.iter().enumerate() {
        let path = format!("steps[{}]", i);
        if step.image.as_deref().map_or(true, str::is_empty) {
            errors.push(FieldError::missing_field("image").via(&path));
        }
        let Some(name) = step.name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        if !is_dns_label(name) {
            errors.push(FieldError::invalid_value(name, "name").via(&path));
        }
        if !names.insert(name) {
            errors.push(
                FieldError::invalid_value(name, "name")
                    .with_details("step names must be unique")
                    .via(&path),
            );
        }
    }

    errors.extend(via(validate_param_specs(&spec.params), "params"));
    errors.extend(via(validate_result_specs(&spec.results), "results"));
    errors
}
