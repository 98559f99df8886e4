use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tektor::core::bundle::{BundleFetcher, BundleOptions, FetchError};
use tektor::core::error::{ResolveError, ResultRefError, ValidationError};
use tektor::core::resources::Pipeline;
use tektor::core::validator::Validator;

/// Serves Task documents keyed by bundle entry name and records every request.
#[derive(Default)]
struct FakeRegistry {
    entries: HashMap<String, String>,
    requests: Mutex<Vec<BundleOptions>>,
}

impl FakeRegistry {
    fn with_task(mut self, name: &str, spec: &str) -> Self {
        let document = format!(
            "apiVersion: tekton.dev/v1\nkind: Task\nmetadata:\n  name: {name}\nspec:\n{spec}"
        );
        self.entries.insert(name.to_string(), document);
        self
    }

    fn requests(&self) -> Vec<BundleOptions> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BundleFetcher for FakeRegistry {
    async fn fetch(&self, options: &BundleOptions) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(options.clone());
        self.entries
            .get(&options.entry_name)
            .map(|document| document.clone().into_bytes())
            .ok_or_else(|| FetchError::NotFound {
                reference: options.bundle.clone(),
            })
    }
}

fn pipeline(yaml: &str) -> Pipeline {
    serde_yaml::from_str(yaml).expect("pipeline fixture")
}

const BUNDLE_PIPELINE: &str = r#"
apiVersion: tekton.dev/v1
kind: Pipeline
metadata:
  name: build
spec:
  tasks:
    - name: clone
      params:
        - name: url
          value: https://github.com/org/repo
      taskRef:
        resolver: bundles
        params:
          - name: bundle
            value: quay.io/org/catalog/task-git-clone:0.1
          - name: name
            value: git-clone
          - name: kind
            value: task
    - name: build
      params:
        - name: revision
          value: $(tasks.clone.results.commit)
      taskRef:
        resolver: bundles
        params:
          - name: bundle
            value: quay.io/org/catalog/task-build:0.1
          - name: name
            value: build
  results:
    - name: commit
      value: $(tasks.clone.results.commit)
"#;

fn catalog() -> FakeRegistry {
    FakeRegistry::default()
        .with_task(
            "git-clone",
            "  params:\n    - name: url\n  results:\n    - name: commit\n  steps:\n    - image: alpine\n",
        )
        .with_task(
            "build",
            "  params:\n    - name: revision\n  steps:\n    - image: alpine\n",
        )
}

#[tokio::test]
async fn test_bundle_backed_pipeline_is_valid() {
    let registry = Arc::new(catalog());
    let validator = Validator::new(registry.clone());
    validator
        .validate_pipeline(&pipeline(BUNDLE_PIPELINE))
        .await
        .expect("valid pipeline");

    let requests = registry.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].bundle, "quay.io/org/catalog/task-git-clone:0.1");
    assert_eq!(requests[0].kind, "task");
    assert_eq!(requests[1].kind, "task");
    assert!(requests.iter().all(|r| r.service_account == "none"));
}

#[tokio::test]
async fn test_reference_to_undeclared_result_fails() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: a
      taskSpec:
        results:
          - name: url
        steps:
          - image: alpine
    - name: b
      params:
        - name: digest
          value: $(tasks.a.results.digest)
      taskSpec:
        params:
          - name: digest
        steps:
          - image: alpine
"#,
    );
    let err = Validator::new(Arc::new(FakeRegistry::default()))
        .validate_pipeline(&p)
        .await
        .unwrap_err();
    match &err {
        ValidationError::TaskResults { step, source } => {
            assert_eq!(step, "b");
            assert_eq!(
                source,
                &ResultRefError::UnknownResult {
                    step: "a".into(),
                    result: "digest".into()
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "b pipeline task results: non-existent digest result from a pipeline task"
    );
}

#[tokio::test]
async fn test_matrix_references_are_checked() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: a
      taskSpec:
        results:
          - name: url
        steps:
          - image: alpine
    - name: b
      matrix:
        params:
          - name: x
            value:
              - $(tasks.a.results.missing)
        include:
          - name: extra
            params:
              - name: y
                value: $(tasks.a.results.url)
      taskSpec:
        steps:
          - image: alpine
"#,
    );
    let err = Validator::new(Arc::new(FakeRegistry::default()))
        .validate_pipeline(&p)
        .await
        .unwrap_err();
    match &err {
        ValidationError::TaskResults { step, source } => {
            assert_eq!(step, "b");
            assert_eq!(
                source,
                &ResultRefError::UnknownResult {
                    step: "a".into(),
                    result: "missing".into()
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_matrix_include_references_are_checked() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: a
      taskSpec:
        results:
          - name: url
        steps:
          - image: alpine
    - name: b
      matrix:
        params:
          - name: x
            value:
              - $(tasks.a.results.url)
        include:
          - name: extra
            params:
              - name: y
                value: $(tasks.a.results.missing)
      taskSpec:
        steps:
          - image: alpine
"#,
    );
    let err = Validator::new(Arc::new(FakeRegistry::default()))
        .validate_pipeline(&p)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "b pipeline task results: non-existent missing result from a pipeline task"
    );
}

#[tokio::test]
async fn test_missing_bundle_names_the_step() {
    let registry = Arc::new(FakeRegistry::default());
    let err = Validator::new(registry)
        .validate_pipeline(&pipeline(BUNDLE_PIPELINE))
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        ValidationError::TaskResolution {
            source: ResolveError::BundleFetch(FetchError::NotFound { .. }),
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "retrieving task spec from clone pipeline task: fetching bundle entry: quay.io/org/catalog/task-git-clone:0.1 not found"
    );
}

#[tokio::test]
async fn test_first_failing_step_wins_and_stops_fetching() {
    let registry = Arc::new(
        FakeRegistry::default()
            .with_task("git-clone", "  params:\n    - name: depth\n  steps:\n    - image: alpine\n")
            .with_task("build", "  steps:\n    - image: alpine\n"),
    );
    let err = Validator::new(registry.clone())
        .validate_pipeline(&pipeline(BUNDLE_PIPELINE))
        .await
        .unwrap_err();
    assert_eq!(err.step(), Some("clone"));
    assert_eq!(
        err.to_string(),
        "clone pipeline task parameters:\n  * \"url\" parameter is not defined by the Task\n  * \"depth\" parameter is required"
    );
    assert_eq!(registry.requests().len(), 1);
}

#[tokio::test]
async fn test_parameter_errors_win_over_earlier_result_errors() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: first
      params:
        - name: x
          value: $(tasks.nowhere.results.y)
      taskSpec:
        params:
          - name: x
        steps:
          - image: alpine
    - name: second
      params:
        - name: unknown
          value: z
      taskSpec:
        steps:
          - image: alpine
"#,
    );
    let err = Validator::new(Arc::new(FakeRegistry::default()))
        .validate_pipeline(&p)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::Parameters { ref step, .. } if step == "second"));
}

#[tokio::test]
async fn test_references_may_point_forward_and_from_finally() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: consumer
      when:
        - input: $(tasks.producer.results.ready)
          operator: in
          values: ["true"]
      taskSpec:
        steps:
          - image: alpine
    - name: producer
      taskSpec:
        results:
          - name: ready
        steps:
          - image: alpine
  finally:
    - name: notify
      params:
        - name: status
          value: $(tasks.producer.results['ready'])
      taskSpec:
        params:
          - name: status
        steps:
          - image: alpine
"#,
    );
    let validator = Validator::new(Arc::new(FakeRegistry::default()));
    assert!(validator.validate_pipeline(&p).await.is_ok());
}

#[tokio::test]
async fn test_pipeline_results_are_checked_last() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: build
      taskSpec:
        results:
          - name: digest
        steps:
          - image: alpine
  results:
    - name: image
      value: $(tasks.build.results.digest)@$(tasks.build.results.url)
"#,
    );
    let err = Validator::new(Arc::new(FakeRegistry::default()))
        .validate_pipeline(&p)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "pipeline results: non-existent url result from build pipeline task"
    );
    assert_eq!(err.step(), None);
}

#[tokio::test]
async fn test_unknown_producer_is_reported() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: build
      params:
        - name: src
          value: ["$(tasks.fetch.results.path)"]
      taskSpec:
        params:
          - name: src
            type: array
        steps:
          - image: alpine
"#,
    );
    let err = Validator::new(Arc::new(FakeRegistry::default()))
        .validate_pipeline(&p)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "build pipeline task results: path result from non-existent fetch pipeline task"
    );
}

#[tokio::test]
async fn test_structural_failures_stop_before_any_fetch() {
    let registry = Arc::new(catalog());
    let broken = BUNDLE_PIPELINE.replace("name: build\nspec:", "name: build.v1\nspec:");
    let err = Validator::new(registry.clone())
        .validate_pipeline(&pipeline(&broken))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid resource name: special character . must not be present: metadata.name"
    );
    assert!(registry.requests().is_empty());
}

#[tokio::test]
async fn test_explicit_service_account_is_kept() {
    let registry = Arc::new(catalog());
    let with_account = BUNDLE_PIPELINE.replace(
        "          - name: kind\n            value: task\n",
        "          - name: kind\n            value: task\n          - name: serviceAccount\n            value: builder\n",
    );
    Validator::new(registry.clone())
        .with_default_service_account("pipeline")
        .validate_pipeline(&pipeline(&with_account))
        .await
        .unwrap();
    let accounts: Vec<String> = registry
        .requests()
        .into_iter()
        .map(|r| r.service_account)
        .collect();
    assert_eq!(accounts, vec!["builder", "pipeline"]);
}

#[tokio::test]
async fn test_bundle_alias_and_unsupported_refs() {
    let registry = Arc::new(catalog());
    let aliased = BUNDLE_PIPELINE.replace("resolver: bundles", "resolver: bundle");
    assert!(Validator::new(registry.clone())
        .validate_pipeline(&pipeline(&aliased))
        .await
        .is_ok());

    let git = BUNDLE_PIPELINE.replace("resolver: bundles", "resolver: git");
    let err = Validator::new(registry)
        .validate_pipeline(&pipeline(&git))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "retrieving task spec from clone pipeline task: unable to retrieve spec for pipeline task"
    );
}

#[tokio::test]
async fn test_custom_tasks_are_rejected() {
    let p = pipeline(
        r#"
metadata:
  name: p
spec:
  tasks:
    - name: wait
      taskSpec:
        apiVersion: example.dev/v1alpha1
        kind: Wait
        spec:
          duration: 1m
"#,
    );
    let err = Validator::new(Arc::new(FakeRegistry::default()))
        .validate_pipeline(&p)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "retrieving task spec from wait pipeline task: custom Tasks are not supported"
    );
}

#[tokio::test]
async fn test_validation_is_idempotent() {
    let validator = Validator::new(Arc::new(FakeRegistry::default()));
    let p = pipeline(BUNDLE_PIPELINE);
    let first = validator.validate_pipeline(&p).await.unwrap_err().to_string();
    let second = validator.validate_pipeline(&p).await.unwrap_err().to_string();
    assert_eq!(first, second);
}
