//! This module contains business logic for the commands for the application.
//!
//! The main entry point is the [`command_from_args`] function which converts CLI arguments into a command.
use anyhow::Result;

use crate::{
    args::{Bulk, ClientArgs},
    commands::{bulk_delete::BulkDelete, with_chef_server::WithChefServer},
    config::ConfigOverrides,
    formatting::Format,
};
pub use core::{Command, CommandWithOutput, CommandWithOutputExt};

pub mod bulk_delete;
mod core;
mod with_chef_server;

/// Convert CLI arguments into a command.
///
/// The Chef server configuration is resolved here but only reported when the command needs it.
/// The output of the command will be formatted using the provided format and printed to stdout.
pub fn command_from_args(
    args: ClientArgs,
    format: Format,
    overrides: &ConfigOverrides,
) -> Result<Box<dyn Command>> {
    match args {
        ClientArgs::Bulk(Bulk::Delete(delete_args)) => {
            BulkDelete::with_chef_server(delete_args, overrides)?.with_print_to_stdout(format)
        }
    }
}
