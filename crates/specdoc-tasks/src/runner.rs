//! Task execution.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::task::JoinSet;

use crate::TaskError;
use crate::actions::Actions;
use crate::graph::{Action, Step, TaskBody, TaskGraph};

type TaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>>;

/// Lifecycle state of a task within one runner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TaskState {
    #[default]
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

/// Runs tasks from a validated graph.
///
/// Cloning is cheap; clones share the graph, the actions and the task states.
pub struct TaskRunner<A> {
    graph: Arc<TaskGraph>,
    actions: Arc<A>,
    states: Arc<Mutex<HashMap<&'static str, TaskState>>>,
}

impl<A> Clone for TaskRunner<A> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            actions: Arc::clone(&self.actions),
            states: Arc::clone(&self.states),
        }
    }
}

impl<A: Actions> TaskRunner<A> {
    /// Create a runner after validating `graph`.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the graph has unknown references or
    /// cycles.
    pub fn new(graph: TaskGraph, actions: A) -> Result<Self, TaskError> {
        graph.validate()?;
        Ok(Self {
            graph: Arc::new(graph),
            actions: Arc::new(actions),
            states: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    #[must_use]
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    #[must_use]
    pub fn actions(&self) -> &A {
        &self.actions
    }

    /// Current state of the named task.
    #[must_use]
    pub fn state(&self, name: &str) -> TaskState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    /// Run the named task to completion.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UnknownTask`] for a name not in the graph, or the
    /// first error raised by the task's actions.
    pub async fn run(&self, name: &str) -> Result<(), TaskError> {
        let task = self
            .graph
            .get(name)
            .ok_or_else(|| TaskError::UnknownTask(name.to_owned()))?;
        self.clone().run_task(task.name).await
    }

    fn run_task(self, name: &'static str) -> TaskFuture {
        Box::pin(async move {
            let body = self
                .graph
                .get(name)
                .map(|task| task.body.clone())
                .ok_or_else(|| TaskError::UnknownTask(name.to_owned()))?;

            let start = Instant::now();
            self.set_state(name, TaskState::Running);
            tracing::info!(task = name, "Starting task");

            let result = match body {
                TaskBody::Run(action) => self.run_action(action).await,
                TaskBody::Alias(target) => self.clone().run_task(target).await,
                TaskBody::Series(steps) => self.run_series(steps).await,
                TaskBody::Parallel(steps) => self.run_parallel(name, steps).await,
            };

            let elapsed_ms = start.elapsed().as_millis();
            match &result {
                Ok(()) => {
                    self.set_state(name, TaskState::Succeeded);
                    tracing::info!(task = name, elapsed_ms, "Finished task");
                }
                Err(e) => {
                    self.set_state(name, TaskState::Failed);
                    tracing::error!(task = name, elapsed_ms, error = %e, "Task failed");
                }
            }
            result
        })
    }

    fn run_step(self, step: Step) -> TaskFuture {
        match step {
            Step::Task(name) => self.run_task(name),
            Step::Action(action) => Box::pin(async move { self.run_action(action).await }),
        }
    }

    async fn run_action(&self, action: Action) -> Result<(), TaskError> {
        match action {
            Action::Clean => self.actions.clean().await,
            Action::Build => self.actions.build().await,
            Action::Watch => self.actions.watch().await,
            Action::Serve => self.actions.serve().await,
        }
    }

    async fn run_series(&self, steps: Vec<Step>) -> Result<(), TaskError> {
        for step in steps {
            self.clone().run_step(step).await?;
        }
        Ok(())
    }

    async fn run_parallel(&self, name: &'static str, steps: Vec<Step>) -> Result<(), TaskError> {
        let mut set = JoinSet::new();
        for step in steps.iter().cloned() {
            set.spawn(self.clone().run_step(step));
        }

        let mut result = Ok(());
        while let Some(joined) = set.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(TaskError::Aborted {
                    task: name.to_owned(),
                    message: e.to_string(),
                })
            });
            if let Err(e) = outcome {
                result = Err(e);
                break;
            }
        }

        if result.is_err() {
            // Cancel the remaining branches.
            set.shutdown().await;
            for step in &steps {
                if let Step::Task(child) = step
                    && self.state(child) == TaskState::Running
                {
                    self.set_state(*child, TaskState::Failed);
                }
            }
        }
        result
    }

    fn set_state(&self, name: &'static str, state: TaskState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, state);
    }
}
