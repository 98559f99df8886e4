use crate::core::pac::DEFAULT_PAC_COMMAND;
use crate::core::report::OutputFormat;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Pipeline, PipelineRun or Task document (YAML or JSON)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Emit either terminal-friendly text or machine-readable JSON
    #[arg(long, value_enum, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Configuration file (default: ./tektor.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Inline PipelineRun tasks before validating them
    #[arg(
        long,
        value_enum,
        default_value = "none",
        value_name = "MODE",
        help_heading = "PipelineRun Resolution"
    )]
    pub pre_resolve: PreResolve,

    /// Command providing the `pac resolve` subcommand
    #[arg(
        long,
        default_value = DEFAULT_PAC_COMMAND,
        value_name = "CMD",
        help_heading = "PipelineRun Resolution"
    )]
    pub pac_command: String,

    /// Log filter directives, overriding the config file (TEKTOR_LOG still wins)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, clap::ValueEnum, Debug, PartialEq, Eq)]
pub enum PreResolve {
    /// Validate the PipelineRun as written
    None,
    /// Run it through `tkn pac resolve` first
    Pac,
}
