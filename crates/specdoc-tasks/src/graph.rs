//! Static task graph.

use std::collections::HashMap;

use crate::TaskError;

/// Task run when no task name is given.
pub const DEFAULT_TASK: &str = "default";

/// A leaf unit of work, performed by an [`Actions`](crate::Actions) implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Empty the output directory.
    Clean,
    /// Render the entry document into the output directory.
    Build,
    /// Rebuild on every source change until interrupted.
    Watch,
    /// Serve the output directory until interrupted.
    Serve,
}

/// One element of a composite task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Run another task by name.
    Task(&'static str),
    /// Run an action directly.
    Action(Action),
}

/// What running a task does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskBody {
    /// Perform one action.
    Run(Action),
    /// Run another task under this name.
    Alias(&'static str),
    /// Run steps one after another, stopping at the first failure.
    Series(Vec<Step>),
    /// Run steps concurrently; the first failure fails the task.
    Parallel(Vec<Step>),
}

impl TaskBody {
    /// Names of the tasks this body refers to.
    fn references(&self) -> Vec<&'static str> {
        match self {
            Self::Run(_) => Vec::new(),
            Self::Alias(name) => vec![*name],
            Self::Series(steps) | Self::Parallel(steps) => steps
                .iter()
                .filter_map(|step| match step {
                    Step::Task(name) => Some(*name),
                    Step::Action(_) => None,
                })
                .collect(),
        }
    }
}

/// A named task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub name: &'static str,
    /// One-line description shown by `--list`.
    pub description: &'static str,
    pub body: TaskBody,
}

/// Named tasks in declaration order.
#[derive(Clone, Debug)]
pub struct TaskGraph {
    tasks: Vec<Task>,
}

impl TaskGraph {
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// The specdoc task table.
    ///
    /// | Task      | Body                      |
    /// |-----------|---------------------------|
    /// | `clean`   | clean action              |
    /// | `build`   | build action              |
    /// | `watch`   | watch action              |
    /// | `start`   | `watch` ∥ serve action    |
    /// | `default` | alias of `build`          |
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            Task {
                name: "clean",
                description: "Delete everything in the output directory",
                body: TaskBody::Run(Action::Clean),
            },
            Task {
                name: "build",
                description: "Render the entry document into the output directory",
                body: TaskBody::Run(Action::Build),
            },
            Task {
                name: "watch",
                description: "Rebuild whenever a source file changes",
                body: TaskBody::Run(Action::Watch),
            },
            Task {
                name: "start",
                description: "Watch sources and serve the output with live reload",
                body: TaskBody::Parallel(vec![Step::Task("watch"), Step::Action(Action::Serve)]),
            },
            Task {
                name: DEFAULT_TASK,
                description: "Alias of build",
                body: TaskBody::Alias("build"),
            },
        ])
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Check that every referenced task exists and no task refers back to
    /// itself, directly or through other tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::DuplicateTask`], [`TaskError::UnknownReference`]
    /// or [`TaskError::Cycle`].
    pub fn validate(&self) -> Result<(), TaskError> {
        let mut index = HashMap::new();
        for task in &self.tasks {
            if index.insert(task.name, task).is_some() {
                return Err(TaskError::DuplicateTask(task.name.to_owned()));
            }
        }

        for task in &self.tasks {
            for reference in task.body.references() {
                if !index.contains_key(reference) {
                    return Err(TaskError::UnknownReference {
                        task: task.name.to_owned(),
                        reference: reference.to_owned(),
                    });
                }
            }
        }

        let mut done = Vec::new();
        for task in &self.tasks {
            let mut path = Vec::new();
            visit(task.name, &index, &mut path, &mut done)?;
        }
        Ok(())
    }
}

/// Depth-first search for reference cycles.
fn visit(
    name: &'static str,
    index: &HashMap<&'static str, &Task>,
    path: &mut Vec<&'static str>,
    done: &mut Vec<&'static str>,
) -> Result<(), TaskError> {
    if done.contains(&name) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|n| *n == name) {
        let mut chain: Vec<String> = path[start..].iter().map(|n| (*n).to_owned()).collect();
        chain.push(name.to_owned());
        return Err(TaskError::Cycle { chain });
    }

    path.push(name);
    if let Some(task) = index.get(name) {
        for reference in task.body.references() {
            visit(reference, index, path, done)?;
        }
    }
    path.pop();
    done.push(name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn task(name: &'static str, body: TaskBody) -> Task {
        Task {
            name,
            description: "",
            body,
        }
    }

    #[test]
    fn test_standard_graph_is_valid() {
        let graph = TaskGraph::standard();
        graph.validate().unwrap();

        let names: Vec<_> = graph.tasks().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["clean", "build", "watch", "start", "default"]);
    }

    #[test]
    fn test_standard_graph_shape() {
        let graph = TaskGraph::standard();

        assert_eq!(graph.get("default").unwrap().body, TaskBody::Alias("build"));
        assert_eq!(
            graph.get("start").unwrap().body,
            TaskBody::Parallel(vec![Step::Task("watch"), Step::Action(Action::Serve)])
        );
        assert_eq!(graph.get("build").unwrap().body, TaskBody::Run(Action::Build));
        assert!(graph.get("deploy").is_none());
    }

    #[test]
    fn test_unknown_reference() {
        let graph = TaskGraph::new(vec![task("default", TaskBody::Alias("missing"))]);

        let err = graph.validate().unwrap_err();

        assert_eq!(err.to_string(), "Task \"default\" refers to unknown task \"missing\"");
    }

    #[test]
    fn test_cycle() {
        let graph = TaskGraph::new(vec![
            task("a", TaskBody::Series(vec![Step::Task("b")])),
            task("b", TaskBody::Parallel(vec![Step::Action(Action::Build), Step::Task("c")])),
            task("c", TaskBody::Alias("a")),
        ]);

        let err = graph.validate().unwrap_err();

        assert_eq!(err.to_string(), "Task cycle: a -> b -> c -> a");
    }

    #[test]
    fn test_self_alias_is_cycle() {
        let graph = TaskGraph::new(vec![task("a", TaskBody::Alias("a"))]);
        assert!(matches!(graph.validate(), Err(TaskError::Cycle { .. })));
    }

    #[test]
    fn test_shared_dependency_is_not_cycle() {
        let graph = TaskGraph::new(vec![
            task("build", TaskBody::Run(Action::Build)),
            task("a", TaskBody::Series(vec![Step::Task("build")])),
            task("b", TaskBody::Series(vec![Step::Task("build"), Step::Task("a")])),
        ]);
        graph.validate().unwrap();
    }

    #[test]
    fn test_duplicate_task() {
        let graph = TaskGraph::new(vec![
            task("build", TaskBody::Run(Action::Build)),
            task("build", TaskBody::Run(Action::Clean)),
        ]);
        assert!(matches!(graph.validate(), Err(TaskError::DuplicateTask(name)) if name == "build"));
    }
}
