use crate::logging::ConsoleOutput;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "tektor.toml";

/// Errors raised while loading or checking `tektor.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config file {0} does not exist")]
    Missing(PathBuf),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tektor configuration loaded from tektor.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TektorConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub bundle: BundleConfig,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// OCI registry client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Registries reached over plain http
    #[serde(default)]
    pub plain_http: Vec<String>,

    /// Auth file consulted before the standard docker/podman locations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_config: Option<PathBuf>,
}

/// Bundle resolver settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleConfig {
    /// Injected into bundle references without a serviceAccount param
    #[serde(default = "default_service_account")]
    pub default_service_account: String,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub default_level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_output: Option<ConsoleOutput>,

    #[serde(default)]
    pub enable_file: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_service_account() -> String {
    "none".to_string()
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            timeout_seconds: default_timeout_seconds(),
            plain_http: Vec::new(),
            docker_config: None,
        }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        BundleConfig {
            default_service_account: default_service_account(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            default_level: default_level(),
            console_output: None,
            enable_file: false,
            log_dir: None,
        }
    }
}
