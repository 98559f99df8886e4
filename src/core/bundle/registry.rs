use super::credentials::{Credentials, Keychain};
use super::layer::{read_tar_layer, verify_digest};
use super::reference::ImageReference;
use super::{
    BundleFetcher, BundleOptions, FetchError, KIND_ANNOTATION, MAXIMUM_BUNDLE_OBJECTS,
    TITLE_ANNOTATION,
};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
application/vnd.docker.distribution.manifest.v2+json, \
application/vnd.oci.image.index.v1+json, \
application/vnd.docker.distribution.manifest.list.v2+json";

const TOKEN_CLIENT_ID: &str = "tektor";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    layers: Vec<Descriptor>,
    #[serde(default)]
    manifests: Vec<Descriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Descriptor {
    digest: String,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// OCI distribution client that pulls Tekton bundle entries.
pub struct RegistryClient {
    http: reqwest::Client,
    keychain: Arc<dyn Keychain>,
    plain_http: Vec<String>,
}

impl RegistryClient {
    pub fn new(
        keychain: Arc<dyn Keychain>,
        timeout: Duration,
        plain_http: Vec<String>,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tektor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Transport {
                url: String::new(),
                source,
            })?;
        Ok(Self {
            http,
            keychain,
            plain_http,
        })
    }

    fn scheme(&self, reference: &ImageReference) -> &'static str {
        let host = reference.host();
        let local = host == "localhost"
            || host == "127.0.0.1"
            || host == "::1"
            || host.ends_with(".local");
        if local || self.plain_http.iter().any(|r| r == &reference.registry) {
            "http"
        } else {
            "https"
        }
    }

    fn base_url(&self, reference: &ImageReference) -> String {
        format!(
            "{}://{}/v2/{}",
            self.scheme(reference),
            reference.registry,
            reference.repository
        )
    }

    async fn fetch_manifest(
        &self,
        session: &mut Session,
        reference: &ImageReference,
    ) -> Result<Manifest, FetchError> {
        let url = format!(
            "{}/manifests/{}",
            self.base_url(reference),
            reference.identifier()
        );
        let response = self.get(session, reference, &url, MANIFEST_ACCEPT).await?;
        response
            .json::<Manifest>()
            .await
            .map_err(|source| FetchError::Transport { url, source })
    }

    async fn fetch_blob(
        &self,
        session: &mut Session,
        reference: &ImageReference,
        digest: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/blobs/{}", self.base_url(reference), digest);
        let response = self.get(session, reference, &url, "*/*").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        verify_digest(digest, &bytes)?;
        Ok(bytes.to_vec())
    }

    /// GET with anonymous access first, then the challenge the registry answers with.
    async fn get(
        &self,
        session: &mut Session,
        reference: &ImageReference,
        url: &str,
        accept: &str,
    ) -> Result<reqwest::Response, FetchError> {
        let response = self.send(url, accept, session.authorization.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(reference, url, response).await;
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        session.authorization = Some(self.authorize(reference, &challenge).await?);
        let response = self.send(url, accept, session.authorization.as_deref()).await?;
        check_status(reference, url, response).await
    }

    async fn send(
        &self,
        url: &str,
        accept: &str,
        authorization: Option<&str>,
    ) -> Result<reqwest::Response, FetchError> {
        let mut request = self.http.get(url).header(ACCEPT, accept);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request.send().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn authorize(
        &self,
        reference: &ImageReference,
        challenge: &str,
    ) -> Result<String, FetchError> {
        let credentials = self.keychain.resolve(&reference.registry);
        let unauthorized = |detail: &str| FetchError::Unauthorized {
            reference: reference.to_string(),
            detail: detail.to_string(),
        };

        let (scheme, params) = parse_challenge(challenge);
        match scheme.to_ascii_lowercase().as_str() {
            "basic" => match credentials {
                Credentials::Basic { username, password } => {
                    Ok(basic_header(&username, &password))
                }
                _ => Err(unauthorized("registry requires basic credentials")),
            },
            "bearer" => {
                let realm = params
                    .get("realm")
                    .ok_or_else(|| unauthorized("bearer challenge without realm"))?;
                let realm = Url::parse(realm)
                    .ok()
                    .filter(|url| matches!(url.scheme(), "http" | "https"))
                    .ok_or_else(|| unauthorized(&format!("invalid token realm {:?}", realm)))?;
                let scope = params
                    .get("scope")
                    .cloned()
                    .unwrap_or_else(|| format!("repository:{}:pull", reference.repository));
                let service = params.get("service").cloned().unwrap_or_default();
                let token = self
                    .exchange_token(realm.as_str(), &service, &scope, credentials)
                    .await?;
                Ok(format!("Bearer {}", token))
            }
            _ => Err(unauthorized(&format!(
                "unsupported authentication challenge {:?}",
                challenge
            ))),
        }
    }

    async fn exchange_token(
        &self,
        realm: &str,
        service: &str,
        scope: &str,
        credentials: Credentials,
    ) -> Result<String, FetchError> {
        tracing::debug!(realm, service, scope, "requesting registry token");
        let request = match credentials {
            Credentials::IdentityToken(refresh_token) => self.http.post(realm).form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("service", service),
                ("scope", scope),
                ("client_id", TOKEN_CLIENT_ID),
            ]),
            Credentials::Basic { username, password } => self
                .http
                .get(realm)
                .query(&[("service", service), ("scope", scope)])
                .basic_auth(username, Some(password)),
            Credentials::Anonymous => self
                .http
                .get(realm)
                .query(&[("service", service), ("scope", scope)]),
        };
        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: realm.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Unauthorized {
                reference: realm.to_string(),
                detail: format!("token request returned {}: {}", status.as_u16(), body),
            });
        }
        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|source| FetchError::Transport {
                    url: realm.to_string(),
                    source,
                })?;
        token
            .token
            .or(token.access_token)
            .ok_or_else(|| FetchError::Unauthorized {
                reference: realm.to_string(),
                detail: "token response did not contain a token".to_string(),
            })
    }
}

#[derive(Default)]
struct Session {
    authorization: Option<String>,
}

#[async_trait]
impl BundleFetcher for RegistryClient {
    async fn fetch(&self, options: &BundleOptions) -> Result<Vec<u8>, FetchError> {
        let reference = ImageReference::parse(&options.bundle)?;
        tracing::info!(
            bundle = %reference,
            kind = %options.kind,
            name = %options.entry_name,
            "fetching bundle entry"
        );
        let mut session = Session::default();

        let manifest = self.fetch_manifest(&mut session, &reference).await?;
        if manifest.layers.is_empty() && !manifest.manifests.is_empty() {
            return Err(FetchError::Registry {
                url: self.base_url(&reference),
                status: StatusCode::OK.as_u16(),
                body: "bundle is an image index, expected an image manifest".to_string(),
            });
        }
        if manifest.layers.len() > MAXIMUM_BUNDLE_OBJECTS {
            return Err(FetchError::TooManyLayers {
                reference: reference.to_string(),
                max: MAXIMUM_BUNDLE_OBJECTS,
            });
        }

        let layer = manifest
            .layers
            .iter()
            .find(|layer| {
                let kind = layer.annotations.get(KIND_ANNOTATION);
                let title = layer.annotations.get(TITLE_ANNOTATION);
                kind.is_some_and(|k| k.eq_ignore_ascii_case(&options.kind))
                    && title.is_some_and(|t| t == &options.entry_name)
            })
            .ok_or_else(|| FetchError::NoMatchingEntry {
                kind: options.kind.clone(),
                name: options.entry_name.clone(),
            })?;

        let blob = self
            .fetch_blob(&mut session, &reference, &layer.digest)
            .await?;
        read_tar_layer(&layer.digest, &blob)
    }
}

async fn check_status(
    reference: &ImageReference,
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(FetchError::NotFound {
            reference: reference.to_string(),
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FetchError::Unauthorized {
            reference: reference.to_string(),
            detail: body,
        }),
        _ => Err(FetchError::Registry {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        }),
    }
}

fn challenge_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_]+)="([^"]*)""#).expect("valid challenge parameter regex")
    })
}

/// Split a `WWW-Authenticate` header into its scheme and parameters.
fn parse_challenge(header: &str) -> (String, HashMap<String, String>) {
    let header = header.trim();
    let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));
    let params = challenge_param_regex()
        .captures_iter(rest)
        .map(|caps| (caps[1].to_ascii_lowercase(), caps[2].to_string()))
        .collect();
    (scheme.to_string(), params)
}

fn basic_header(username: &str, password: &str) -> String {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", username, password))
    )
}
