//! specdoc CLI - Specification document build tool.
//!
//! Runs one of the named tasks:
//! - `clean`: Delete everything in the output directory
//! - `build`: Render the entry document into the output directory
//! - `watch`: Rebuild whenever a source file changes
//! - `start`: Watch and serve the output with live reload
//! - `default`: Alias of `build`

mod commands;
mod error;
mod output;

use clap::Parser;
use specdoc_tasks::TaskGraph;
use tracing_subscriber::EnvFilter;

use commands::{RunArgs, list_tasks};
use error::CliError;
use output::Output;

/// specdoc - Specification document build tool.
#[derive(Parser)]
#[command(name = "specdoc", version, about)]
struct Cli {
    /// List the available tasks and exit.
    #[arg(long)]
    list: bool,

    #[command(flatten)]
    run: RunArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let filter = if cli.run.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.list {
        list_tasks(&TaskGraph::standard(), &output);
        return;
    }

    if let Err(err) = run(cli.run) {
        output.error(&err);
        std::process::exit(1);
    }
}

fn run(args: RunArgs) -> Result<(), CliError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(args.execute())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_flag() {
        let cli = Cli::try_parse_from(["specdoc", "--list"]).unwrap();

        assert!(cli.list);
        assert_eq!(cli.run.task, "default");
    }
}
