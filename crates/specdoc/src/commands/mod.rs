//! CLI command implementations.

pub(crate) mod list;
pub(crate) mod run;

pub(crate) use list::list_tasks;
pub(crate) use run::RunArgs;
