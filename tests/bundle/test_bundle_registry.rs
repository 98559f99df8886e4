use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tektor::core::bundle::{
    AnonymousKeychain, BundleFetcher, BundleOptions, FetchError, RegistryClient,
};
use tektor::core::resources::Document;
use tektor::core::validator::Validator;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GIT_CLONE_TASK: &str = r#"apiVersion: tekton.dev/v1
kind: Task
metadata:
  name: git-clone
spec:
  params:
    - name: url
  results:
    - name: commit
  steps:
    - image: alpine
"#;

fn layer(name: &str, body: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut tar_header = tar::Header::new_gnu();
    tar_header.set_size(body.len() as u64);
    tar_header.set_mode(0o644);
    tar_header.set_cksum();
    builder
        .append_data(&mut tar_header, name, body.as_bytes())
        .unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&builder.into_inner().unwrap()).unwrap();
    encoder.finish().unwrap()
}

fn digest_of(blob: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(blob)))
}

fn descriptor(digest: &str, kind: &str, name: &str) -> serde_json::Value {
    json!({
        "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
        "digest": digest,
        "size": 0,
        "annotations": {
            "dev.tekton.image.apiVersion": "v1",
            "dev.tekton.image.kind": kind,
            "dev.tekton.image.name": name,
        }
    })
}

fn manifest(layers: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "layers": layers,
    })
}

fn client() -> RegistryClient {
    RegistryClient::new(Arc::new(AnonymousKeychain), Duration::from_secs(5), vec![]).unwrap()
}

fn options(server: &MockServer, name: &str) -> BundleOptions {
    BundleOptions {
        service_account: "none".to_string(),
        bundle: format!("127.0.0.1:{}/org/catalog:v1", server.address().port()),
        entry_name: name.to_string(),
        kind: "task".to_string(),
    }
}

async fn serve_catalog(server: &MockServer) {
    let blob = layer("git-clone", GIT_CLONE_TASK);
    let digest = digest_of(&blob);
    Mock::given(method("GET"))
        .and(path("/v2/org/catalog/manifests/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest(vec![
            descriptor("sha256:0000", "pipeline", "git-clone"),
            descriptor(&digest, "task", "git-clone"),
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/org/catalog/blobs/{}", digest)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(blob))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetches_the_entry_matching_kind_and_name() {
    let server = MockServer::start().await;
    serve_catalog(&server).await;

    let body = client()
        .fetch(&options(&server, "git-clone"))
        .await
        .unwrap();
    assert_eq!(String::from_utf8(body).unwrap(), GIT_CLONE_TASK);
}

#[tokio::test]
async fn test_missing_manifest_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let opts = options(&server, "git-clone");
    let err = client().fetch(&opts).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }));
    assert_eq!(err.to_string(), format!("{} not found", opts.bundle));
}

#[tokio::test]
async fn test_unknown_entries_are_reported() {
    let server = MockServer::start().await;
    serve_catalog(&server).await;

    let err = client()
        .fetch(&options(&server, "buildah"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not find object in image with kind: task and name: buildah"
    );
}

#[tokio::test]
async fn test_bundles_with_too_many_objects_are_rejected() {
    let server = MockServer::start().await;
    let layers = (0..21)
        .map(|i| descriptor("sha256:0000", "task", &format!("task-{}", i)))
        .collect();
    Mock::given(method("GET"))
        .and(path("/v2/org/catalog/manifests/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest(layers)))
        .mount(&server)
        .await;

    let err = client()
        .fetch(&options(&server, "task-0"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::TooManyLayers { max: 20, .. }));
}

#[tokio::test]
async fn test_tampered_layers_fail_digest_verification() {
    let server = MockServer::start().await;
    let digest = digest_of(b"the original layer");
    Mock::given(method("GET"))
        .and(path("/v2/org/catalog/manifests/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest(vec![descriptor(
            &digest,
            "task",
            "git-clone",
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/org/catalog/blobs/{}", digest)))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(layer("git-clone", GIT_CLONE_TASK)),
        )
        .mount(&server)
        .await;

    let err = client()
        .fetch(&options(&server, "git-clone"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::DigestMismatch { .. }));
}

#[tokio::test]
async fn test_bearer_challenges_are_answered_with_a_token() {
    let server = MockServer::start().await;
    let blob = layer("git-clone", GIT_CLONE_TASK);
    let digest = digest_of(&blob);

    Mock::given(method("GET"))
        .and(path("/token"))
        .and(query_param("service", "test-registry"))
        .and(query_param("scope", "repository:org/catalog:pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "s3cret"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/org/catalog/manifests/v1"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest(vec![descriptor(
            &digest,
            "task",
            "git-clone",
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/org/catalog/blobs/{}", digest)))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(blob))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/org/catalog/manifests/v1"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            format!(
                r#"Bearer realm="{}/token",service="test-registry""#,
                server.uri()
            )
            .as_str(),
        ))
        .with_priority(10)
        .mount(&server)
        .await;

    let body = client()
        .fetch(&options(&server, "git-clone"))
        .await
        .unwrap();
    assert_eq!(String::from_utf8(body).unwrap(), GIT_CLONE_TASK);
}

#[tokio::test]
async fn test_pipelines_resolve_tasks_from_a_live_registry() {
    let server = MockServer::start().await;
    serve_catalog(&server).await;
    let bundle = format!("127.0.0.1:{}/org/catalog:v1", server.address().port());

    let document = Document::parse(
        "pipeline.yaml",
        format!(
            r#"apiVersion: tekton.dev/v1
kind: Pipeline
metadata:
  name: build
spec:
  tasks:
    - name: clone
      taskRef:
        resolver: bundles
        params:
          - name: bundle
            value: {bundle}
          - name: name
            value: git-clone
          - name: kind
            value: task
"#
        )
        .as_bytes(),
    )
    .unwrap();

    let err = Validator::new(Arc::new(client()))
        .validate_document(&document)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "clone pipeline task parameters:\n  * \"url\" parameter is required"
    );
}
