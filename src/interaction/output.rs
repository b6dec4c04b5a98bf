use console::{Term, style};

use super::{Interaction, MessageOutput};
use crate::columns::list_in_columns;

impl MessageOutput for Interaction {
    fn msg(&self, message: &str) {
        eprintln!("{message}");
    }

    fn info(&self, message: &str) {
        eprintln!("{}", style(message).cyan().for_stderr());
    }

    fn warn(&self, message: &str) {
        eprintln!("{} {message}", style("WARNING:").yellow().bold().for_stderr());
    }

    fn print_names(&self, names: &[String]) {
        let (_, width) = Term::stderr().size();
        eprint!("{}", format_names(names, usize::from(width)));
    }
}

/// Names in columns, framed by blank lines.
fn format_names(names: &[String], line_width: usize) -> String {
    format!("\n{}\n", list_in_columns(names, line_width))
}
