//! Task actions.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use specdoc_build::{BuildReport, Builder};
use specdoc_config::Config;
use specdoc_server::{DevServer, DevServerConfig};
use specdoc_watch::{ChangeEvent, ChangeStream, Watcher};
use tokio::sync::watch;

use crate::TaskError;

/// The leaf operations tasks are built from.
pub trait Actions: Send + Sync + 'static {
    /// Empty the output directory.
    fn clean(&self) -> impl Future<Output = Result<(), TaskError>> + Send;

    /// Render the entry document into the output directory.
    fn build(&self) -> impl Future<Output = Result<(), TaskError>> + Send;

    /// Rebuild on every source change.
    ///
    /// Runs until the process is interrupted or a running `serve` finishes.
    fn watch(&self) -> impl Future<Output = Result<(), TaskError>> + Send;

    /// Serve the output directory until Ctrl-C, then stop any running `watch`.
    fn serve(&self) -> impl Future<Output = Result<(), TaskError>> + Send;
}

/// Actions backed by the real builder, watcher and dev server.
pub struct DocActions {
    builder: Arc<Builder>,
    source_dir: PathBuf,
    watch_patterns: Vec<String>,
    debounce: Duration,
    server: DevServerConfig,
    stop: watch::Sender<bool>,
}

impl DocActions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            builder: Arc::new(Builder::from_config(config)),
            source_dir: config.paths.source_dir.clone(),
            watch_patterns: config.paths.watch_patterns.clone(),
            debounce: Duration::from_millis(config.live_reload.debounce_ms),
            server: DevServerConfig::from_config(config),
            stop: watch::Sender::new(false),
        }
    }

    /// Ask a running `watch` to finish.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Run a build on the blocking pool.
    async fn build_blocking(&self) -> Result<BuildReport, TaskError> {
        let builder = Arc::clone(&self.builder);
        tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| TaskError::Aborted {
                task: "build".to_owned(),
                message: e.to_string(),
            })?
            .map_err(TaskError::from)
    }
}

impl Actions for DocActions {
    async fn clean(&self) -> Result<(), TaskError> {
        let builder = Arc::clone(&self.builder);
        tokio::task::spawn_blocking(move || builder.clean())
            .await
            .map_err(|e| TaskError::Aborted {
                task: "clean".to_owned(),
                message: e.to_string(),
            })??;
        Ok(())
    }

    async fn build(&self) -> Result<(), TaskError> {
        self.build_blocking().await.map(|_| ())
    }

    async fn watch(&self) -> Result<(), TaskError> {
        let changes = Watcher::new(&self.source_dir, &self.watch_patterns, self.debounce)?.start()?;
        tracing::info!(dir = %changes.root().display(), "Watching for changes");
        let mut stop = self.stop.subscribe();

        let rebuilds = rebuild_on_change(changes, |batch| async move {
            if let Some(first) = batch.first() {
                tracing::info!(
                    path = %first.path.display(),
                    changes = batch.len(),
                    "Source changed, rebuilding"
                );
            }
            self.build_blocking().await.map(|_| ())
        });

        tokio::select! {
            result = rebuilds => result,
            _ = stop.wait_for(|stopped| *stopped) => {
                tracing::info!("Stopped watching");
                Ok(())
            }
        }
    }

    async fn serve(&self) -> Result<(), TaskError> {
        let server = DevServer::bind(self.server.clone()).await?;
        let result = server.run_until_ctrl_c().await;
        self.stop();
        result.map_err(TaskError::from)
    }
}

/// Call `rebuild` once per batch of changes until the stream ends.
///
/// Batches are handled one at a time, so rebuilds never overlap; changes
/// arriving during a rebuild are queued for the next call. A failed rebuild
/// is logged and the loop keeps going.
///
/// # Errors
///
/// Returns [`TaskError::Watch`] if the watch itself fails.
pub async fn rebuild_on_change<F, Fut>(mut changes: ChangeStream, mut rebuild: F) -> Result<(), TaskError>
where
    F: FnMut(Vec<ChangeEvent>) -> Fut,
    Fut: Future<Output = Result<(), TaskError>>,
{
    while let Some(batch) = changes.next_batch().await {
        let batch = batch?;
        if let Err(e) = rebuild(batch).await {
            tracing::error!(error = %e, "Rebuild failed");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{TaskGraph, TaskRunner, TaskState};
    use pretty_assertions::assert_eq;

    fn project() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/index.html"),
            "<emu-clause id=sec-a><h1>A</h1></emu-clause>",
        )
        .unwrap();
        let config = Config::default_with_base(dir.path());
        (dir, config)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clean_and_build_tasks() {
        let (dir, config) = project();
        let docs = dir.path().join("docs");
        let runner = TaskRunner::new(TaskGraph::standard(), DocActions::from_config(&config)).unwrap();

        runner.run("default").await.unwrap();
        assert!(docs.join("index.html").is_file());

        runner.run("clean").await.unwrap();
        assert!(docs.is_dir());
        assert_eq!(fs::read_dir(&docs).unwrap().count(), 0);
        assert_eq!(runner.state("clean"), TaskState::Succeeded);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_source_fails_build_without_output() {
        let (dir, config) = project();
        fs::write(dir.path().join("src/index.html"), "<emu-clause id=a><h1>A</h1>").unwrap();
        let runner = TaskRunner::new(TaskGraph::standard(), DocActions::from_config(&config)).unwrap();

        let err = runner.run("build").await.unwrap_err();

        assert!(matches!(err, TaskError::Build(_)));
        assert_eq!(runner.state("build"), TaskState::Failed);
        assert!(!dir.path().join("docs/index.html").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_watch_task_finishes_when_stopped() {
        let (_dir, config) = project();
        let runner = TaskRunner::new(TaskGraph::standard(), DocActions::from_config(&config)).unwrap();

        let task = tokio::spawn({
            let runner = runner.clone();
            async move { runner.run("watch").await }
        });
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while runner.state("watch") != TaskState::Running && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        runner.actions().stop();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("watch did not stop")
            .unwrap()
            .unwrap();
        assert_eq!(runner.state("watch"), TaskState::Succeeded);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_each_change_triggers_a_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let changes = Watcher::new(dir.path(), &[], Duration::ZERO)
            .unwrap()
            .start()
            .unwrap();
        let builds = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&builds);
        let watch = tokio::spawn(rebuild_on_change(changes, move |_batch| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        for name in ["a.html", "b.html", "c.html"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while builds.load(Ordering::SeqCst) < 3 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(builds.load(Ordering::SeqCst) >= 3);
        watch.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_rebuild_keeps_watching() {
        let dir = tempfile::tempdir().unwrap();
        let changes = Watcher::new(dir.path(), &[], Duration::from_millis(50))
            .unwrap()
            .start()
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let watch = tokio::spawn(rebuild_on_change(changes, move |_batch| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::UnknownTask("broken".to_owned()))
            }
        }));

        fs::write(dir.path().join("a.html"), "a").unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        fs::write(dir.path().join("b.html"), "b").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) < 2 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert!(!watch.is_finished());
        watch.abort();
    }
}
