//! Core traits shared by every command.
//!
//! - [`Command`] is what the dispatcher in `main` executes.
//! - [`CommandWithOutput`] is implemented by the business logic, it returns a result instead of printing it.
//!
//! [`CommandWithOutputExt::with_print_to_stdout`] glues both together: the result is formatted
//! in the requested [`Format`] and written to stdout.
use std::io::{self, Write};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::formatting::{Format, Formattable};

/// A unit of work that can be executed.
#[async_trait]
pub trait Command {
    async fn execute(&mut self) -> Result<()>;
}

/// A command that produces an output.
#[async_trait]
pub trait CommandWithOutput {
    type Output;

    async fn execute(&mut self) -> Result<Self::Output>;
}

pub trait CommandWithOutputExt {
    /// Turn a [`CommandWithOutput`] into a [`Command`] that prints its output to stdout.
    fn with_print_to_stdout(self, format: Format) -> Result<Box<dyn Command>>;
}

/// Wrapper command that writes the formatted output of a [`CommandWithOutput`].
pub struct PrintOutputCommand<C> {
    command: C,
    format: Format,
    writer: Box<dyn Write + Send>,
}

impl<C> PrintOutputCommand<C> {
    pub fn new(command: C, format: Format, writer: Box<dyn Write + Send>) -> Self {
        Self {
            command,
            format,
            writer,
        }
    }
}

#[async_trait]
impl<C, O> Command for PrintOutputCommand<C>
where
    C: CommandWithOutput<Output = O> + Send,
    O: Formattable,
{
    async fn execute(&mut self) -> Result<()> {
        let output = self.command.execute().await?;
        let formatted_output = output.format(self.format)?;

        writeln!(self.writer, "{}", formatted_output).context("writing command output")?;
        self.writer.flush().context("writing command output")?;

        Ok(())
    }
}

impl<C, O> CommandWithOutputExt for C
where
    C: CommandWithOutput<Output = O> + Send + 'static,
    O: Formattable + 'static,
{
    fn with_print_to_stdout(self, format: Format) -> Result<Box<dyn Command>> {
        Ok(Box::new(PrintOutputCommand::new(
            self,
            format,
            Box::new(io::stdout()),
        )))
    }
}
