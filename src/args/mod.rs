//! CLI argument parsing layer.
//!
//! This module provides the CLI interface using clap derive macros.
//! It handles parsing command-line arguments and converting them into structured data types.
//!
//! The business logic layer is [`crate::commands`], which receives these parsed arguments.

use clap::{Parser, Subcommand};

mod cli;

pub use cli::Cli;

/// Root command enum for client management.
#[derive(Subcommand, Debug)]
#[command(about = "Manage API clients of a Chef server")]
pub enum ClientArgs {
    /// Operate on many clients at once.
    #[command(subcommand)]
    Bulk(Bulk),
}

#[derive(Subcommand, Debug)]
pub enum Bulk {
    Delete(BulkDelete),
}

/// Delete the clients whose name matches a regular expression.
///
/// The expression is matched anywhere in the name, anchor it with ^ and $ to match whole names.
/// Validator clients are only deleted when --force-validators is given.
/// Every batch of deletions is confirmed first.
#[derive(Parser, Debug)]
pub struct BulkDelete {
    /// Regular expression matched against client names.
    #[arg(index = 1, value_name = "REGEX")]
    pub regex: Option<String>,

    /// Also delete matching validator clients.
    #[arg(short = 'f', long = "force-validators")]
    pub force_validators: bool,
}
