//! Root command for the CLI.
//!
//! This module contains the root command structure that handles executing the CLI
//! both as a plugin (when invoked via `knife client`) and as a standalone CLI (when invoked directly as `knife-client`).
//!
//! The commands are defined in the [`ClientArgs`](super::ClientArgs) enum.
use std::{env::args, path::PathBuf};

use clap::{Args, Subcommand};

use crate::{config::ConfigOverrides, formatting::Format};

use super::ClientArgs;

/// Manage API clients of a Chef server
#[derive(Args, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global_args: GlobalArgs,

    #[command(subcommand)]
    pub command: PluginSubCommands,
}

/// Implement the Parser trait to allow us to use the Cli struct as a root command.
///
/// This allows us to invoke `Cli::parse()` to parse the CLI arguments.
impl clap::Parser for Cli {}

impl Cli {
    /// Create a new command with the correct binary name based on if we're executing as a plugin or directly.
    ///
    /// Setting the binary name changes the usage string in the help text.
    fn new_command() -> clap::Command {
        let command = binary_name(args().nth(1).as_deref());

        clap::Command::new(command).bin_name(command)
    }
}

/// "knife" when the first argument is "client", i.e. we're executed as a knife plugin.
fn binary_name(first_arg: Option<&str>) -> &'static str {
    if first_arg == Some("client") {
        "knife"
    } else {
        "knife-client"
    }
}

/// Manually implement the CommandFactory trait so the usage string matches the execution mode:
/// - as a plugin (`knife client`), the usage string is "Usage: knife client bulk delete [REGEX]".
/// - directly (`knife-client`), the usage string is "Usage: knife-client bulk delete [REGEX]".
impl clap::CommandFactory for Cli {
    fn command() -> clap::Command {
        // Same as what the Parser derive macro generates, apart from `Cli::new_command()`.
        let __clap_app = Cli::new_command();
        <Self as clap::Args>::augment_args(__clap_app)
    }

    fn command_for_update() -> clap::Command {
        let __clap_app = Cli::new_command();
        <Self as clap::Args>::augment_args_for_update(__clap_app)
    }
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable debug logging.
    ///
    /// Setting this flag will set the log level to debug and only show logs from this crate.
    ///
    /// The log level can also be set with the `KNIFE_CLIENT_LOG` environment variable.
    /// If the `KNIFE_CLIENT_LOG_ALL` environment variable is set, logs from all crates are shown.
    #[arg(global = true, hide = true, long, short = 'D', default_value = "false")]
    pub debug: bool,

    /// Output format.
    #[arg(global = true, long = "output", short = 'o')]
    pub format: Option<Format>,

    /// Name of the profile to use from the credentials file.
    #[arg(global = true, long, short = 'P', env = "CHEF_PROFILE")]
    pub profile: Option<String>,

    /// URL of the Chef server, including the organization.
    #[arg(global = true, long, env = "CHEF_SERVER_URL")]
    pub server_url: Option<String>,

    /// Name of the API client used to sign requests.
    #[arg(global = true, long = "user", short = 'u', env = "CHEF_CLIENT_NAME")]
    pub client_name: Option<String>,

    /// Private key of the API client used to sign requests.
    #[arg(global = true, long = "key", short = 'k', env = "CHEF_CLIENT_KEY")]
    pub client_key: Option<PathBuf>,

    /// Credentials file to read profiles from, defaults to ~/.chef/credentials.
    #[arg(global = true, long, env = "CHEF_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,
}

impl From<&GlobalArgs> for ConfigOverrides {
    fn from(args: &GlobalArgs) -> Self {
        ConfigOverrides {
            profile: args.profile.clone(),
            server_url: args.server_url.clone(),
            client_name: args.client_name.clone(),
            client_key: args.client_key.clone(),
            credentials_file: args.credentials_file.clone(),
        }
    }
}

/// Enum representing the different ways the CLI can be invoked.
///
/// This enum handles the dual nature of the CLI: it can be run as a plugin (`knife client`)
/// or as a standalone command (`knife-client`).
#[derive(Subcommand, Debug)]
pub enum PluginSubCommands {
    /// Manage API clients.
    #[command(hide = true)]
    Client {
        #[command(subcommand)]
        command: ClientArgs,
    },
    /// This is the root subcommand when executing the executable directly.
    #[command(flatten)]
    Flat(ClientArgs),
}

/// Extract the actual command from the plugin wrapper if needed.
impl From<PluginSubCommands> for ClientArgs {
    fn from(command: PluginSubCommands) -> Self {
        match command {
            PluginSubCommands::Client { command } => command,
            PluginSubCommands::Flat(command) => command,
        }
    }
}
