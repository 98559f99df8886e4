use crate::core::config::LoggingSettings;
use crate::logging::layers::console::ConsoleOutput;
use crate::Result;
use anyhow::anyhow;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

/// Resolved logging configuration after applying CLI overrides to the config file section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
    pub default_level: String,
    pub enable_file: bool,
    pub console_output: ConsoleOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_settings(&LoggingSettings::default())
    }
}

impl LoggingConfig {
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            log_dir: settings.log_dir.clone(),
            default_level: settings.default_level.clone(),
            enable_file: settings.enable_file,
            console_output: settings.console_output.unwrap_or_default(),
        }
    }

    /// Replace the configured level, as `--log-level` does.
    pub fn with_level_override(mut self, level: Option<&str>) -> Result<Self> {
        if let Some(level) = level {
            self.default_level = level.to_string();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        for directive in self.default_level.split(',') {
            Directive::from_str(directive.trim())
                .map_err(|_| anyhow!("log level {:?} is not a valid tracing directive", directive))?;
        }
        Ok(())
    }
}
