use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use super::{Interaction, SpinnerHandle, SpinnerInteraction};

impl SpinnerInteraction for Interaction {
    fn start_spinner(&self, message: String) -> Result<SpinnerHandle> {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .context("creating spinner style")?;

        // Draws on stderr, hidden when stderr is not a terminal.
        let progress_bar = ProgressBar::new_spinner()
            .with_style(style)
            .with_message(message);
        progress_bar.enable_steady_tick(Duration::from_millis(80));

        Ok(SpinnerHandle::new(Box::new(move || {
            progress_bar.finish_and_clear();
        })))
    }
}
