//! `specdoc --list` implementation.

use specdoc_tasks::TaskGraph;

use crate::output::Output;

/// Format one row of the task table.
fn task_line(name: &str, description: &str, width: usize) -> String {
    format!("  {name:<width$}  {description}")
}

/// Print the available tasks with their descriptions.
pub(crate) fn list_tasks(graph: &TaskGraph, output: &Output) {
    let width = graph
        .tasks()
        .iter()
        .map(|task| task.name.len())
        .max()
        .unwrap_or(0);

    output.heading("Available tasks:");
    for task in graph.tasks() {
        output.line(&task_line(task.name, task.description, width));
    }
}
