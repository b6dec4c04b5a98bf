use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::debug;

use crate::{
    args::{Cli, ClientArgs},
    commands::{bulk_delete::BulkDeleteError, command_from_args},
    config::ConfigOverrides,
    logging::setup_logging,
};

mod args;
mod columns;
mod commands;
mod config;
mod dependencies;
mod formatting;
mod interaction;
mod logging;
mod models;

/// Exit status when no regular expression was given.
const MISSING_PATTERN_EXIT_CODE: u8 = 42;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.global_args.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_error(&error);
            ExitCode::from(exit_code(&error))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.global_args.format.unwrap_or_default();
    let overrides = ConfigOverrides::from(&cli.global_args);
    let args = ClientArgs::from(cli.command);
    debug!(?args, ?format, "running command");

    let mut command = command_from_args(args, format, &overrides)?;
    command.execute().await
}

fn report_error(error: &anyhow::Error) {
    if let Some(error @ BulkDeleteError::MissingPattern) = error.downcast_ref::<BulkDeleteError>() {
        eprintln!("{} {error}", style("FATAL:").red().bold().for_stderr());
    } else {
        eprintln!("{} {error:#}", style("Error:").red().bold().for_stderr());
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<BulkDeleteError>() {
        Some(BulkDeleteError::MissingPattern) => MISSING_PATTERN_EXIT_CODE,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};

    use super::*;

    #[test]
    fn test_exit_code_missing_pattern() {
        let error = anyhow::Error::from(BulkDeleteError::MissingPattern);

        assert_eq!(exit_code(&error), 42);
    }

    #[test]
    fn test_exit_code_other_errors() {
        let invalid = anyhow::Error::from(BulkDeleteError::InvalidPattern {
            pattern: "(".to_string(),
            source: regex::Regex::new("(").unwrap_err(),
        });
        let failed: Result<()> = Err(anyhow!("500 Internal Server Error"));
        let failed = failed.context("deleting client 'web1'").unwrap_err();

        assert_eq!(exit_code(&invalid), 1);
        assert_eq!(exit_code(&failed), 1);
    }
}
