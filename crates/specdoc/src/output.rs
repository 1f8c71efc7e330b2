//! Styled status lines on stderr.

use std::fmt::Display;
use std::time::Duration;

use console::{Style, Term};

/// Width of the label column in [`Output::field`] lines.
const LABEL_WIDTH: usize = 18;

/// Terminal reporter for task progress.
pub(crate) struct Output {
    term: Term,
    task: Style,
    done: Style,
    failed: Style,
    label: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            task: Style::new().cyan().bold(),
            done: Style::new().green(),
            failed: Style::new().red(),
            label: Style::new().dim(),
        }
    }

    /// `Running 'task'` with the task name highlighted.
    pub(crate) fn task_started(&self, task: &str) {
        self.write(&format!("Running '{}'", self.task.apply_to(task)));
    }

    pub(crate) fn task_finished(&self, task: &str, elapsed: Duration) {
        let line = format!("Finished '{task}' after {} ms", elapsed.as_millis());
        self.write(&self.done.apply_to(line).to_string());
    }

    pub(crate) fn error(&self, err: &dyn Display) {
        self.write(&self.failed.apply_to(format!("Error: {err}")).to_string());
    }

    /// Aligned `label  value` line under a task header.
    pub(crate) fn field(&self, label: &str, value: &dyn Display) {
        let label = self.label.apply_to(padded_label(label));
        self.write(&format!("  {label} {value}"));
    }

    pub(crate) fn heading(&self, text: &str) {
        self.write(&self.task.apply_to(text).to_string());
    }

    pub(crate) fn line(&self, text: &str) {
        self.write(text);
    }

    fn write(&self, line: &str) {
        let _ = self.term.write_line(line);
    }
}

/// Pad before styling so escape codes do not skew the column.
fn padded_label(label: &str) -> String {
    format!("{:<LABEL_WIDTH$}", format!("{label}:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labels_share_one_column() {
        assert_eq!(padded_label("Entry"), "Entry:            ");
        assert_eq!(padded_label("Output directory").len(), LABEL_WIDTH);
    }
}
