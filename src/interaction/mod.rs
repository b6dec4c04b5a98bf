//! User interaction: confirmation prompts, progress spinners and messages.
//!
//! Commands depend on the traits defined here, [`Interaction`] is the terminal implementation.
//! Everything is written to stderr so stdout only carries the command output.
use anyhow::Result;
use typed_builder::TypedBuilder;

mod output;
mod prompt;
mod spinner;

#[derive(Debug, Default, Clone)]
pub struct Interaction;

impl Interaction {
    pub fn new() -> Self {
        Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ConfirmationPromptOptions {
    #[builder(setter(into))]
    message: String,
    /// Answer used when the user just presses enter, without it an explicit answer is required.
    #[builder(default, setter(strip_option))]
    default: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPromptResult {
    Yes,
    No,
    Canceled,
}

pub trait ConfirmationPrompt {
    fn confirm(&self, options: ConfirmationPromptOptions) -> Result<ConfirmationPromptResult>;
}

/// Plain messages shown to the user.
pub trait MessageOutput {
    fn msg(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    /// Print names in columns, surrounded by blank lines.
    fn print_names(&self, names: &[String]);
}

pub struct SpinnerHandle {
    stop_spinner: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SpinnerHandle {
    pub fn new(stop_spinner: Box<dyn FnOnce() + Send + Sync>) -> Self {
        Self {
            stop_spinner: Some(stop_spinner),
        }
    }
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        if let Some(stop_spinner) = self.stop_spinner.take() {
            stop_spinner();
        }
    }
}

pub trait SpinnerInteraction {
    fn start_spinner(&self, message: String) -> Result<SpinnerHandle>;
}
