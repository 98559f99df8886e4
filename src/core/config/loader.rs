use super::{ConfigError, ConfigValidator, TektorConfig, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

pub const ENV_REGISTRY_TIMEOUT_SECONDS: &str = "TEKTOR_REGISTRY_TIMEOUT_SECONDS";
pub const ENV_REGISTRY_PLAIN_HTTP: &str = "TEKTOR_REGISTRY_PLAIN_HTTP";
pub const ENV_DOCKER_CONFIG: &str = "TEKTOR_DOCKER_CONFIG";
pub const ENV_DEFAULT_SERVICE_ACCOUNT: &str = "TEKTOR_DEFAULT_SERVICE_ACCOUNT";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the effective configuration and validate it.
    ///
    /// An explicit path must exist; otherwise `tektor.toml` in `dir` is used when present.
    /// Environment variables override file values.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<TektorConfig, ConfigError> {
        let mut config = match explicit {
            Some(path) => {
                Self::load_from_file(path)?.ok_or_else(|| ConfigError::Missing(path.to_path_buf()))?
            }
            None => Self::load_from_file(&dir.join(CONFIG_FILE_NAME))?.unwrap_or_default(),
        };

        Self::apply_env_overrides(&mut config);
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<TektorConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: TektorConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }

    /// Environment variables take precedence over config file values.
    /// Unparseable numbers are ignored.
    fn apply_env_overrides(config: &mut TektorConfig) {
        if let Ok(timeout) = env::var(ENV_REGISTRY_TIMEOUT_SECONDS) {
            if let Ok(timeout) = timeout.trim().parse::<u64>() {
                config.registry.timeout_seconds = timeout;
            }
        }

        if let Ok(registries) = env::var(ENV_REGISTRY_PLAIN_HTTP) {
            config.registry.plain_http = registries
                .split(',')
                .map(str::trim)
                .filter(|registry| !registry.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(path) = env::var(ENV_DOCKER_CONFIG) {
            if !path.trim().is_empty() {
                config.registry.docker_config = Some(PathBuf::from(path));
            }
        }

        if let Ok(service_account) = env::var(ENV_DEFAULT_SERVICE_ACCOUNT) {
            config.bundle.default_service_account = service_account;
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "TEKTOR_REGISTRY_TIMEOUT_SECONDS - Override the registry request timeout (default: 30)",
            "TEKTOR_REGISTRY_PLAIN_HTTP - Comma separated registries reached over http",
            "TEKTOR_DOCKER_CONFIG - Auth file consulted before the docker/podman defaults",
            "TEKTOR_DEFAULT_SERVICE_ACCOUNT - Service account injected into bundle references (default: none)",
            "TEKTOR_LOG - Log filter directives, e.g. tektor=debug",
        ]
    }
}
