use super::{ConfigError, TektorConfig};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &TektorConfig) -> Result<(), ConfigError> {
        if config.registry.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "registry.timeout_seconds must be at least 1".to_string(),
            ));
        }

        if config.bundle.default_service_account.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "bundle.default_service_account cannot be empty".to_string(),
            ));
        }

        for directive in config.logging.default_level.split(',') {
            Directive::from_str(directive.trim()).map_err(|_| {
                ConfigError::Invalid(
                    "logging.default_level must be a valid tracing directive".to_string(),
                )
            })?;
        }

        Ok(())
    }
}
