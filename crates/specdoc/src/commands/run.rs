//! Task execution command.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use specdoc_config::{CliSettings, Config};
use specdoc_tasks::{DEFAULT_TASK, DocActions, TaskError, TaskGraph, TaskRunner};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for running a task.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Task to run (see --list).
    #[arg(default_value = DEFAULT_TASK)]
    pub task: String,

    /// Path to configuration file (default: auto-discover specdoc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Host to bind the dev server to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind the dev server to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,

    /// Enable verbose output (task progress and rebuild logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RunArgs {
    /// Execute the selected task.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the task fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host.clone(),
            port: self.port,
            output_dir: self.output_dir.clone(),
            live_reload_enabled: self.resolve_live_reload_enabled(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let runner = TaskRunner::new(TaskGraph::standard(), DocActions::from_config(&config))?;
        if runner.graph().get(&self.task).is_none() {
            return Err(TaskError::UnknownTask(self.task).into());
        }

        print_startup(&output, &self.task, &config);

        let start = Instant::now();
        runner.run(&self.task).await?;
        output.task_finished(&self.task, start.elapsed());
        Ok(())
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}

fn print_startup(output: &Output, task: &str, config: &Config) {
    output.task_started(task);
    output.field("Entry", &config.paths.entry.display());
    output.field("Output directory", &config.paths.output_dir.display());

    match task {
        "watch" => output.field("Watching", &config.paths.source_dir.display()),
        "start" => {
            output.field("Watching", &config.paths.source_dir.display());
            let url = format!("http://{}:{}", config.server.host, config.server.port);
            output.field("Serving", &url);
            let live_reload = if config.live_reload.enabled { "enabled" } else { "disabled" };
            output.field("Live reload", &live_reload);
        }
        _ => {}
    }
}
