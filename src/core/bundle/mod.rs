//! Fetching Tekton resources out of OCI bundles.

pub mod credentials;
pub mod layer;
pub mod reference;
pub mod registry;

pub use credentials::{AnonymousKeychain, Credentials, DockerConfigKeychain, Keychain};
pub use reference::ImageReference;
pub use registry::RegistryClient;

use crate::core::resources::Param;
use async_trait::async_trait;
use std::collections::HashMap;

pub const PARAM_BUNDLE: &str = "bundle";
pub const PARAM_NAME: &str = "name";
pub const PARAM_KIND: &str = "kind";
pub const PARAM_SERVICE_ACCOUNT: &str = "serviceAccount";

pub const KIND_ANNOTATION: &str = "dev.tekton.image.kind";
pub const TITLE_ANNOTATION: &str = "dev.tekton.image.name";

/// Most objects a single bundle may carry.
pub const MAXIMUM_BUNDLE_OBJECTS: usize = 20;

const DEFAULT_KIND: &str = "task";

/// Errors raised while fetching a bundle entry.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    InvalidOptions(String),
    #[error("invalid bundle reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unauthorized to pull {reference}: {detail}")]
    Unauthorized { reference: String, detail: String },
    #[error("{reference} not found")]
    NotFound { reference: String },
    #[error("registry returned {status} for {url}: {body}")]
    Registry {
        url: String,
        status: u16,
        body: String,
    },
    #[error("could not find object in image with kind: {kind} and name: {name}")]
    NoMatchingEntry { kind: String, name: String },
    #[error("bundle {reference} contained more than the maximum {max} allowed objects")]
    TooManyLayers { reference: String, max: usize },
    #[error("layer {expected} failed digest verification, computed {actual}")]
    DigestMismatch { expected: String, actual: String },
    #[error("reading layer {digest}: {reason}")]
    Layer { digest: String, reason: String },
}

/// Bundle resolver options derived from a task reference's params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    pub service_account: String,
    pub bundle: String,
    pub entry_name: String,
    pub kind: String,
}

impl BundleOptions {
    /// Build options from resolver params; later params win over earlier ones of the same name.
    pub fn from_params(params: &[Param]) -> Result<Self, FetchError> {
        let values: HashMap<&str, &str> = params
            .iter()
            .map(|param| (param.name.as_str(), param.as_string().unwrap_or("")))
            .collect();
        let required = |name: &str| -> Result<String, FetchError> {
            match values.get(name) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(FetchError::InvalidOptions(format!(
                    "parameter {:?} required",
                    name
                ))),
            }
        };

        let service_account = match values.get(PARAM_SERVICE_ACCOUNT) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => {
                return Err(FetchError::InvalidOptions(
                    "default Service Account was not set during installation of the bundle resolver"
                        .to_string(),
                ))
            }
        };
        let bundle = required(PARAM_BUNDLE)?;
        ImageReference::parse(&bundle)?;
        let entry_name = required(PARAM_NAME)?;
        let kind = values
            .get(PARAM_KIND)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
            .unwrap_or_else(|| DEFAULT_KIND.to_string());

        Ok(Self {
            service_account,
            bundle,
            entry_name,
            kind,
        })
    }
}

/// Retrieves the serialized resource a bundle entry points at.
#[async_trait]
pub trait BundleFetcher: Send + Sync {
    async fn fetch(&self, options: &BundleOptions) -> Result<Vec<u8>, FetchError>;
}
