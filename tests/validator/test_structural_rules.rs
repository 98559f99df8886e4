use tektor::core::resources::{Pipeline, PipelineRun, Task};
use tektor::core::structural::{format_field_errors, FieldError, StructuralValidate};

fn pipeline_lines(yaml: &str) -> Vec<String> {
    let pipeline: Pipeline = serde_yaml::from_str(yaml).expect("pipeline fixture");
    format_field_errors(&pipeline.validate_structure())
}

#[test]
fn test_translation_trims_message_and_prefixes_details() {
    let errors = vec![
        FieldError::new("invalid value: ", vec!["spec.tasks[0].name".into()])
            .with_details("must be a DNS label"),
        FieldError::new("invalid spec: ", vec![]),
        FieldError::missing_field("spec.tasks"),
    ];
    assert_eq!(
        format_field_errors(&errors),
        vec![
            "invalid value: spec.tasks[0].name must be a DNS label",
            "invalid spec: ",
            "missing field(s): spec.tasks",
        ]
    );
}

#[test]
fn test_every_offending_path_gets_a_line() {
    let lines = pipeline_lines(
        r#"
metadata:
  name: p
spec:
  params:
    - name: flags
      type: array
      default: "-v"
  tasks:
    - name: clone
      taskRef:
        name: git-clone
    - name: clone
      taskSpec:
        steps: []
"#,
    );
    assert_eq!(
        lines,
        vec![
            r#""array" type does not match default value's type: "string": spec.params.flags.type"#,
            r#""array" type does not match default value's type: "string": spec.params.flags.default.type"#,
            "missing field(s): spec.tasks[1].taskSpec.steps",
            "expected exactly one, got both: spec.tasks[1].name",
        ]
    );
}

#[test]
fn test_finally_tasks_share_the_name_namespace() {
    let lines = pipeline_lines(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: build
      taskRef:
        name: build
  finally:
    - name: build
      taskRef:
        name: notify
"#,
    );
    assert_eq!(lines, vec!["expected exactly one, got both: spec.finally[0].name"]);
}

#[test]
fn test_long_and_dotted_names_are_rejected() {
    let name = "a".repeat(64);
    let task: Task = serde_yaml::from_str(&format!(
        "metadata:\n  name: {name}\nspec:\n  steps:\n    - image: alpine\n"
    ))
    .unwrap();
    assert_eq!(
        format_field_errors(&task.validate_structure()),
        vec!["Invalid resource name: length must be no more than 63 characters: metadata.name"]
    );

    let run: PipelineRun =
        serde_yaml::from_str("metadata:\n  name: a.b\nspec:\n  pipelineRef:\n    name: p\n")
            .unwrap();
    assert_eq!(
        format_field_errors(&run.validate_structure()),
        vec!["Invalid resource name: special character . must not be present: metadata.name"]
    );
}

#[test]
fn test_object_params_need_properties() {
    let task: Task = serde_yaml::from_str(
        r#"
metadata:
  name: t
spec:
  params:
    - name: git
      type: object
  results:
    - name: ok
  steps:
    - image: alpine
"#,
    )
    .unwrap();
    assert_eq!(
        format_field_errors(&task.validate_structure()),
        vec!["missing field(s): spec.params.git.properties"]
    );
}
