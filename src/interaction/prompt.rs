use anyhow::Result;
use inquire::{Confirm, InquireError};

use super::{ConfirmationPrompt, ConfirmationPromptOptions, ConfirmationPromptResult, Interaction};

impl ConfirmationPrompt for Interaction {
    fn confirm(&self, options: ConfirmationPromptOptions) -> Result<ConfirmationPromptResult> {
        let mut prompt = Confirm::new(&options.message);

        // Without a default, inquire keeps asking until the user answers y or n.
        if let Some(default) = options.default {
            prompt = prompt.with_default(default);
        }

        match prompt.prompt() {
            Ok(true) => Ok(ConfirmationPromptResult::Yes),
            Ok(false) => Ok(ConfirmationPromptResult::No),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                Ok(ConfirmationPromptResult::Canceled)
            }
            Err(err) => Err(anyhow::anyhow!("error prompting for confirmation: {}", err)),
        }
    }
}
