use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VALID_PIPELINE: &str = r#"apiVersion: tekton.dev/v1
kind: Pipeline
metadata:
  name: build
spec:
  tasks:
    - name: clone
      params:
        - name: url
          value: https://github.com/org/repo
      taskSpec:
        params:
          - name: url
        results:
          - name: commit
        steps:
          - image: alpine
    - name: build
      params:
        - name: revision
          value: $(tasks.clone.results.commit)
      taskSpec:
        params:
          - name: revision
        steps:
          - image: alpine
  results:
    - name: commit
      value: $(tasks.clone.results.commit)
"#;

const MISSING_PARAM_PIPELINE: &str = r#"apiVersion: tekton.dev/v1
kind: Pipeline
metadata:
  name: greet
spec:
  tasks:
    - name: greet
      taskSpec:
        params:
          - name: greeting
        steps:
          - image: alpine
"#;

const RESOLVED_RUN: &str = r#"apiVersion: tekton.dev/v1
kind: PipelineRun
metadata:
  name: build-run
spec:
  pipelineSpec:
    tasks:
      - name: greet
        taskSpec:
          params:
            - name: greeting
          steps:
            - image: alpine
"#;

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn tektor(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tektor").unwrap();
    cmd.current_dir(dir)
        .env("DOCKER_CONFIG", dir)
        .env_remove("TEKTOR_LOG")
        .env_remove("TEKTOR_DOCKER_CONFIG")
        .env_remove("TEKTOR_DEFAULT_SERVICE_ACCOUNT");
    cmd
}

#[test]
fn test_valid_pipeline_exits_zero() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "pipeline.yaml", VALID_PIPELINE);

    tektor(dir.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "{} is valid",
            file.display()
        )));
}

#[test]
fn test_parameter_failures_go_to_stderr() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "pipeline.yaml", MISSING_PARAM_PIPELINE);

    tektor(dir.path())
        .args(["validate", "pipeline.yaml"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "greet pipeline task parameters:\n  * \"greeting\" parameter is required",
        ));
    assert!(file.exists());
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    write(&dir, "pipeline.yaml", MISSING_PARAM_PIPELINE);

    let output = tektor(dir.path())
        .args(["validate", "pipeline.yaml", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["file"], "pipeline.yaml");
    assert_eq!(report["kind"], "Pipeline");
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"][0]["category"], "parameter");
    assert_eq!(report["errors"][0]["step"], "greet");
}

#[test]
fn test_structural_failures_list_every_path() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "task.yaml",
        "apiVersion: tekton.dev/v1\nkind: Task\nmetadata:\n  name: my.task\nspec:\n  steps:\n    - name: build\n",
    );

    tektor(dir.path())
        .args(["validate", "task.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid resource name: special character . must not be present: metadata.name",
        ))
        .stderr(predicate::str::contains("missing field(s): spec.steps[0].image"));
}

#[test]
fn test_unsupported_kind() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "cm.yaml",
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n",
    );

    tektor(dir.path())
        .args(["validate", "cm.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("v1/ConfigMap is not supported"));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();

    tektor(dir.path())
        .args(["validate", "absent.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reading absent.yaml"));
}

#[test]
fn test_config_from_working_directory_is_validated() {
    let dir = TempDir::new().unwrap();
    write(&dir, "pipeline.yaml", VALID_PIPELINE);
    write(&dir, "tektor.toml", "[registry]\ntimeout_seconds = 0\n");

    tektor(dir.path())
        .args(["validate", "pipeline.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timeout_seconds"));
}

#[cfg(unix)]
#[test]
fn test_pipeline_run_pre_resolution() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "run.yaml",
        "apiVersion: tekton.dev/v1\nkind: PipelineRun\nmetadata:\n  generateName: build-\nspec:\n  pipelineRef:\n    name: build\n",
    );
    write(&dir, "resolved.yaml", RESOLVED_RUN);
    write(
        &dir,
        "fake-tkn.sh",
        r#"
while [ "$#" -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
cp resolved.yaml "$out"
"#,
    );

    tektor(dir.path())
        .args(["validate", "run.yaml"])
        .assert()
        .success();

    tektor(dir.path())
        .args(["validate", "run.yaml", "--pre-resolve", "pac", "--pac-command"])
        .arg(format!("sh {}", dir.path().join("fake-tkn.sh").display()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("\"greeting\" parameter is required"));
}

#[test]
fn test_help_and_version() {
    Command::cargo_bin("tektor")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("Static contract validator"));

    Command::cargo_bin("tektor")
        .unwrap()
        .args(["validate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--pre-resolve"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("TEKTOR_REGISTRY_TIMEOUT_SECONDS"))
        .stdout(predicate::str::contains("TEKTOR_DEFAULT_SERVICE_ACCOUNT"));

    Command::cargo_bin("tektor")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
