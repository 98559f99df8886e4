use super::{
    is_dns_label, validate_object_meta, validate_param_specs, validate_result_specs, via,
    FieldError, StructuralValidate,
};
use crate::core::resources::{Param, Pipeline, PipelineResult, PipelineSpec, PipelineTask, TaskRef};
use crate::core::substitution::{pipeline_result_refs, pipeline_task_result_refs};
use std::collections::HashSet;

const DNS_LABEL_DETAILS: &str = "Pipeline Task name must be a valid DNS Label, For more info refer to https://kubernetes.io/docs/concepts/overview/working-with-objects/names/#names";

impl StructuralValidate for Pipeline {
    fn validate_structure(&self) -> Vec<FieldError> {
        let mut errors = via(validate_object_meta(&self.metadata, false), "metadata");
        errors.extend(via(validate_pipeline_spec(&self.spec), "spec"));
        errors
    }
}

/// Rules for a pipeline body. Paths are relative to `spec`.
pub fn validate_pipeline_spec(spec: &PipelineSpec) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if spec.tasks.is_empty() {
        errors.push(FieldError::missing_field("tasks"));
    }

    errors.extend(via(validate_param_specs(&spec.params), "params"));

    let main_names: HashSet<&str> = spec.tasks.iter().map(|t| t.name.as_str()).collect();
    let finally_names: HashSet<&str> = spec.finally.iter().map(|t| t.name.as_str()).collect();
    let mut seen = HashSet::new();

    for (i, task) in spec.tasks.iter().enumerate() {
        let path = format!("tasks[{}]", i);
        errors.extend(via(validate_pipeline_task(task), &path));
        if !task.name.is_empty() && !seen.insert(task.name.as_str()) {
            errors.push(FieldError::multiple_one_of(&["name"]).via(&path));
        }
        for dependency in &task.run_after {
            if !main_names.contains(dependency.as_str()) || dependency == &task.name {
                errors.push(FieldError::invalid_value(dependency, "runAfter").via(&path));
            }
        }
        for reference in pipeline_task_result_refs(task) {
            if finally_names.contains(reference.pipeline_task.as_str()) {
                errors.push(
                    FieldError::invalid_value(&reference, path.clone()).with_details(
                        "main pipeline tasks cannot reference results of finally tasks",
                    ),
                );
            }
        }
    }

    for (i, task) in spec.finally.iter().enumerate() {
        let path = format!("finally[{}]", i);
        errors.extend(via(validate_pipeline_task(task), &path));
        if !task.name.is_empty() && !seen.insert(task.name.as_str()) {
            errors.push(FieldError::multiple_one_of(&["name"]).via(&path));
        }
        if !task.run_after.is_empty() {
            errors.push(FieldError::disallowed_field("runAfter").via(&path));
        }
    }

    for (i, result) in spec.results.iter().enumerate() {
        errors.extend(via(validate_pipeline_result(result), &format!("results[{}]", i)));
    }
    errors
}

fn validate_pipeline_task(task: &PipelineTask) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if task.name.is_empty() {
        errors.push(FieldError::missing_field("name"));
    } else if !is_dns_label(&task.name) {
        errors.push(FieldError::invalid_value(&task.name, "name").with_details(DNS_LABEL_DETAILS));
    }

    match (&task.task_ref, &task.task_spec) {
        (Some(_), Some(_)) => errors.push(FieldError::multiple_one_of(&["taskRef", "taskSpec"])),
        (None, None) => errors.push(FieldError::missing_one_of(&["taskRef", "taskSpec"])),
        (Some(task_ref), None) => errors.extend(via(validate_task_ref(task_ref), "taskRef")),
        (None, Some(embedded)) if !embedded.is_custom_task() => {
            if embedded.task_spec.steps.is_empty() {
                errors.push(FieldError::missing_field("taskSpec.steps"));
            }
            errors.extend(via(
                validate_param_specs(&embedded.task_spec.params),
                "taskSpec.params",
            ));
            errors.extend(via(
                validate_result_specs(&embedded.task_spec.results),
                "taskSpec.results",
            ));
        }
        (None, Some(_)) => {}
    }

    errors.extend(via(validate_unique_params(&task.params), "params"));
    errors
}

fn validate_task_ref(task_ref: &TaskRef) -> Vec<FieldError> {
    let set = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
    let mut errors = Vec::new();
    match (set(&task_ref.name), set(&task_ref.resolver)) {
        (true, true) => errors.push(FieldError::multiple_one_of(&["name", "resolver"])),
        (false, false) => errors.push(FieldError::missing_field("name")),
        _ => {}
    }
    if !task_ref.params.is_empty() && !set(&task_ref.resolver) {
        errors.push(FieldError::missing_field("resolver"));
    }
    errors.extend(via(validate_unique_params(&task_ref.params), "params"));
    errors
}

fn validate_pipeline_result(result: &PipelineResult) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if result.name.is_empty() {
        errors.push(FieldError::missing_field("name"));
    }
    if result.value.is_none() {
        errors.push(FieldError::missing_field("value"));
    } else if pipeline_result_refs(result).is_empty() {
        errors.push(FieldError::invalid_value(
            "expected pipeline results to be task result expressions but no expressions were found",
            "value",
        ));
    }
    errors
}

/// Param names must be unique within one list. Paths are relative to the list.
pub(crate) fn validate_unique_params(params: &[Param]) -> Vec<FieldError> {
    let mut seen = HashSet::new();
    params
        .iter()
        .filter(|param| !seen.insert(param.name.as_str()))
        .map(|param| {
            FieldError::new(
                "parameter appears more than once",
                vec![format!("[{}]", param.name)],
            )
        })
        .collect()
}
