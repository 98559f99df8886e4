pub mod args;
pub mod commands;

pub use args::{PreResolve, ValidateArgs};
use crate::core::config::ConfigLoader;
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

const VALIDATE_EXAMPLE: &str = "Example:\n    tektor validate /tmp/pipeline.yaml";

fn validate_long_help() -> String {
    let mut help = format!("{}\n\nEnvironment:\n", VALIDATE_EXAMPLE);
    for line in ConfigLoader::env_var_documentation() {
        help.push_str("    ");
        help.push_str(line);
        help.push('\n');
    }
    help
}

#[derive(Parser)]
#[command(name = "tektor")]
#[command(version = crate::VERSION)]
#[command(about = "Static contract validator for Tekton Pipelines, PipelineRuns and Tasks")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Parameters and result references are checked against the Tasks they point at, including Tasks stored in OCI bundles."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Validate a Tekton resource",
        long_about = "Validate checks the schema of a Pipeline, PipelineRun or Task, then the parameter and result contracts between each pipeline task and the Task it runs.",
        after_help = VALIDATE_EXAMPLE,
        after_long_help = validate_long_help()
    )]
    Validate(ValidateArgs),
}

/// Run the parsed command and return the process exit code.
pub async fn run(args: Args) -> crate::Result<i32> {
    match args.command {
        Command::Validate(validate_args) => commands::validate(validate_args).await,
    }
}
