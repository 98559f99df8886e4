use crate::cli::args::{PreResolve, ValidateArgs};
use crate::core::bundle::{DockerConfigKeychain, RegistryClient};
use crate::core::config::{ConfigLoader, TektorConfig};
use crate::core::error::{DefaultErrorReporter, DocumentError, ErrorReporter};
use crate::core::pac::{PacResolver, PassthroughResolver, RunPreResolver};
use crate::core::report::{OutputFormat, ValidationReport};
use crate::core::resources::{type_meta, Document, PIPELINE_RUN_V1};
use crate::core::validator::Validator;
use crate::logging::{self, LoggingConfig};
use crate::Result;
use anyhow::Context;
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// Validate one file; returns 0 when valid and 1 when validation failed.
pub async fn validate(args: ValidateArgs) -> Result<i32> {
    let cwd = env::current_dir().context("failed to determine the working directory")?;
    let config = ConfigLoader::load(args.config.as_deref(), &cwd)?;

    let logging_config = LoggingConfig::from_settings(&config.logging)
        .with_level_override(args.log_level.as_deref())?;
    let logging_guard = logging::init(&logging_config, Some(&cwd))?;
    if let Some(path) = logging_guard.log_file_path() {
        tracing::debug!(path = %path.display(), "writing logs to file");
    }

    tracing::info!(file = %args.file.display(), "validating");

    let source = args.file.display().to_string();
    let data = tokio::fs::read(&args.file)
        .await
        .map_err(|source_err| DocumentError::Read {
            path: args.file.clone(),
            source: source_err,
        })?;

    let data = if type_meta(&source, &data)?.key() == PIPELINE_RUN_V1 {
        pre_resolver(&args)
            .resolve(&args.file, data)
            .await
            .context("pre-resolving PipelineRun")?
    } else {
        data
    };

    let document = Document::parse(&source, &data)?;
    let validator = build_validator(&config)?;
    let outcome = validator.validate_document(&document).await;

    let report = ValidationReport::new(source, document.kind(), &outcome);
    let reporter = DefaultErrorReporter::new();
    match (&outcome, args.format) {
        (Err(error), OutputFormat::Text) => reporter.report_error(error),
        (_, format) => println!("{}", report.render(format)?),
    }

    Ok(if report.valid { 0 } else { 1 })
}

fn pre_resolver(args: &ValidateArgs) -> Box<dyn RunPreResolver> {
    match args.pre_resolve {
        PreResolve::None => Box::new(PassthroughResolver),
        PreResolve::Pac => Box::new(PacResolver::new(args.pac_command.clone())),
    }
}

/// Wire the registry client and keychain described by the configuration.
pub fn build_validator(config: &TektorConfig) -> Result<Validator> {
    let keychain = DockerConfigKeychain::from_env(config.registry.docker_config.clone());
    tracing::debug!(paths = ?keychain.paths(), "registry auth files");
    let client = RegistryClient::new(
        Arc::new(keychain),
        Duration::from_secs(config.registry.timeout_seconds),
        config.registry.plain_http.clone(),
    )
    .context("failed to create registry client")?;
    Ok(Validator::new(Arc::new(client))
        .with_default_service_account(config.bundle.default_service_account.clone()))
}
