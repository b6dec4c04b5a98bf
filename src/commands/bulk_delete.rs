//! Command to delete every client whose name matches a regular expression.
//!
//! Validator clients are only deleted when `--force-validators` is given, after a confirmation
//! that defaults to yes. Other clients always need an explicit confirmation.
//! Deletions happen one client at a time in name order; the first failure stops the batch.

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::{
    args,
    commands::{
        CommandWithOutput,
        with_chef_server::{TryFromWithChefServer, TryToGetChefServerError},
    },
    dependencies::{ChefServer, ClientDestroyer, ClientLister},
    interaction::{
        ConfirmationPrompt, ConfirmationPromptOptions, ConfirmationPromptResult, Interaction,
        MessageOutput, SpinnerInteraction,
    },
    models::ClientRecord,
};

// Interaction dependencies for the bulk delete command.
pub trait BulkDeleteInteraction:
    ConfirmationPrompt + MessageOutput + SpinnerInteraction + Send + Sync
{
}
impl<T: ConfirmationPrompt + MessageOutput + SpinnerInteraction + Send + Sync> BulkDeleteInteraction
    for T
{
}

// Chef server dependencies for the bulk delete command.
pub trait ClientManager: ClientLister + ClientDestroyer + Send + Sync {}
impl<T: ClientLister + ClientDestroyer + Send + Sync> ClientManager for T {}

#[derive(Debug, thiserror::Error)]
pub enum BulkDeleteError {
    #[error("You must supply a regular expression to match the results against")]
    MissingPattern,
    #[error("invalid regular expression /{pattern}/")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub struct BulkDelete {
    pattern: Option<String>,
    force_validators: bool,

    interaction: Box<dyn BulkDeleteInteraction>,
    // Shared so the error can be returned with its causes while the command keeps it.
    chef_server: Result<Box<dyn ClientManager>, Arc<TryToGetChefServerError>>,
}

impl TryFromWithChefServer<args::BulkDelete> for BulkDelete {
    fn try_from_with_chef_server(
        args: args::BulkDelete,
        chef_server: Result<ChefServer, TryToGetChefServerError>,
    ) -> Result<Self> {
        Ok(Self {
            pattern: args.regex,
            force_validators: args.force_validators,

            interaction: Box::new(Interaction::new()),
            chef_server: chef_server
                .map(|server| Box::new(server) as Box<dyn ClientManager>)
                .map_err(Arc::new),
        })
    }
}

/// Matching clients, split by kind and ordered by name.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub normal: BTreeMap<String, ClientRecord>,
    pub validators: BTreeMap<String, ClientRecord>,
}

impl Partition {
    /// Keep the records whose name contains a match of `pattern`.
    pub fn from_matches(records: impl IntoIterator<Item = ClientRecord>, pattern: &Regex) -> Self {
        let mut partition = Self::default();

        for record in records {
            if !pattern.is_match(&record.name) {
                continue;
            }

            let side = if record.is_validator {
                &mut partition.validators
            } else {
                &mut partition.normal
            };
            side.insert(record.name.clone(), record);
        }

        partition
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.validators.is_empty()
    }
}

/// Result of the bulk delete command, every list is sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BulkDeleteResult {
    NoMatches {
        pattern: String,
    },
    Completed {
        deleted: Vec<String>,
        /// Validators left alone because `--force-validators` was not given.
        skipped_validators: Vec<String>,
        declined_validators: Vec<String>,
        declined_clients: Vec<String>,
    },
}

impl Display for BulkDeleteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatches { pattern } => {
                write!(f, "No clients match the expression /{}/", pattern)
            }
            Self::Completed { deleted, .. } => match deleted.len() {
                0 => write!(f, "No clients deleted"),
                1 => write!(f, "Deleted 1 client"),
                count => write!(f, "Deleted {} clients", count),
            },
        }
    }
}

#[async_trait]
impl CommandWithOutput for BulkDelete {
    type Output = BulkDeleteResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        let pattern = self
            .pattern
            .clone()
            .ok_or(BulkDeleteError::MissingPattern)?;
        let matcher = Regex::new(&pattern).map_err(|source| BulkDeleteError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;

        let chef_server = self
            .chef_server
            .as_ref()
            .map_err(|error| anyhow::Error::new(Arc::clone(error)))?;

        let clients = {
            // Stopped when the handle goes out of scope.
            let _spinner = self.interaction.start_spinner("Fetching clients...".to_string())?;
            chef_server.list_clients().await.context("listing clients")?
        };
        debug!(count = clients.len(), "fetched clients");

        let partition =
            Partition::from_matches(clients.into_iter().map(ClientRecord::from), &matcher);
        debug!(
            normal = partition.normal.len(),
            validators = partition.validators.len(),
            %pattern,
            "matched clients"
        );

        if partition.is_empty() {
            return Ok(BulkDeleteResult::NoMatches { pattern });
        }

        let mut deleted = Vec::new();
        let mut skipped_validators = Vec::new();
        let mut declined_validators = Vec::new();
        let mut declined_clients = Vec::new();

        if !partition.validators.is_empty() {
            let names = sorted_names(&partition.validators);

            if !self.force_validators {
                self.interaction.warn("Following clients are validators and will not be deleted.");
                self.interaction.print_names(&names);
                self.interaction
                    .msg("You must specify --force-validators to delete the validator clients");
                skipped_validators = names;
            } else {
                self.interaction.msg("The following validators will be deleted:");
                self.interaction.print_names(&names);

                let options = ConfirmationPromptOptions::builder()
                    .message("Are you sure you want to delete these validators?")
                    .default(true)
                    .build();
                if self.confirm(options)? {
                    deleted.extend(
                        self.destroy_clients(&**chef_server, &partition.validators).await?,
                    );
                } else {
                    self.interaction.info("Validators not deleted");
                    declined_validators = names;
                }
            }
        }

        if !partition.normal.is_empty() {
            let names = sorted_names(&partition.normal);

            self.interaction.msg("The following clients will be deleted:");
            self.interaction.print_names(&names);

            let options = ConfirmationPromptOptions::builder()
                .message("Are you sure you want to delete these clients?")
                .build();
            if self.confirm(options)? {
                deleted.extend(self.destroy_clients(&**chef_server, &partition.normal).await?);
            } else {
                self.interaction.info("Clients not deleted");
                declined_clients = names;
            }
        }

        Ok(BulkDeleteResult::Completed {
            deleted,
            skipped_validators,
            declined_validators,
            declined_clients,
        })
    }
}

impl BulkDelete {
    /// Ask for confirmation, a canceled prompt counts as "no".
    fn confirm(&self, options: ConfirmationPromptOptions) -> Result<bool> {
        let confirmation = self
            .interaction
            .confirm(options)
            .context("confirming deletion")?;

        Ok(match confirmation {
            ConfirmationPromptResult::Yes => true,
            ConfirmationPromptResult::No => false,
            ConfirmationPromptResult::Canceled => {
                debug!("confirmation prompt canceled");
                false
            }
        })
    }

    /// Delete the clients one by one in name order.
    ///
    /// The first failure is returned, clients deleted before it stay deleted.
    async fn destroy_clients(
        &self,
        chef_server: &dyn ClientManager,
        clients: &BTreeMap<String, ClientRecord>,
    ) -> Result<Vec<String>> {
        let mut deleted = Vec::with_capacity(clients.len());

        for name in clients.keys() {
            chef_server
                .destroy_client(name)
                .await
                .with_context(|| format!("deleting client '{}'", name))?;

            self.interaction.msg(&format!("Deleted client {}", name));
            deleted.push(name.clone());
        }

        Ok(deleted)
    }
}

fn sorted_names(clients: &BTreeMap<String, ClientRecord>) -> Vec<String> {
    clients.keys().cloned().collect()
}
