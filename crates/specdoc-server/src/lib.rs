//! Development server for specdoc output.
//!
//! Serves the output directory over HTTP and, when live reload is enabled,
//! announces every change in that directory to connected browsers:
//!
//! ```text
//! Browser ──HTTP──► axum router
//!                        │
//!                        ├─► /livereload     WebSocket, {"path": "<absolute path>"}
//!                        ├─► /livereload.js  client script
//!                        └─► everything else tower-http ServeDir(output dir)
//!
//! output dir ──notify──► specdoc-watch (debounced) ──► broadcast ──► sockets
//! ```
//!
//! # Example
//!
//! ```no_run
//! use specdoc_server::{DevServer, DevServerConfig};
//!
//! # async fn run() -> Result<(), specdoc_server::ServerError> {
//! let server = DevServer::bind(DevServerConfig::default()).await?;
//! println!("listening on {}", server.local_addr());
//! server.run_until_ctrl_c().await
//! # }
//! ```

mod app;
mod live_reload;
mod middleware;
mod state;

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use specdoc_config::Config;
use specdoc_watch::{WatchError, Watcher};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub use live_reload::ReloadEvent;
use live_reload::LiveReload;
use state::AppState;

/// Dev server configuration.
#[derive(Clone, Debug)]
pub struct DevServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on (`0` picks a free port).
    pub port: u16,
    /// Directory to serve.
    pub root: PathBuf,
    /// Enable live reload.
    pub live_reload: bool,
    /// Quiet period before a burst of output changes is announced.
    pub debounce: Duration,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            root: PathBuf::from("docs"),
            live_reload: true,
            debounce: Duration::from_millis(100),
        }
    }
}

impl DevServerConfig {
    /// Create server configuration from specdoc config.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            root: config.paths.output_dir.clone(),
            live_reload: config.live_reload.enabled,
            debounce: Duration::from_millis(config.live_reload.debounce_ms),
        }
    }
}

/// Error raised by the dev server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address could not be bound (e.g., port already in use).
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("Failed to create {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Watching the output directory failed.
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A bound, not yet running, dev server.
pub struct DevServer {
    listener: TcpListener,
    addr: SocketAddr,
    router: Router,
    state: Arc<AppState>,
    watch_task: Option<JoinHandle<Option<WatchError>>>,
}

impl DevServer {
    /// Bind the listener and start watching the output directory.
    ///
    /// Returns once the socket is listening, so requests made after this
    /// returns are accepted as soon as [`run`](Self::run) is polled. The
    /// output directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound,
    /// [`ServerError::OutputDir`] if the output directory cannot be created
    /// and [`ServerError::Watch`] if it cannot be watched.
    pub async fn bind(config: DevServerConfig) -> Result<Self, ServerError> {
        tokio::fs::create_dir_all(&config.root)
            .await
            .map_err(|source| ServerError::OutputDir {
                path: config.root.clone(),
                source,
            })?;

        let addr_label = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr_label.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: addr_label,
            source,
        })?;

        let (live_reload, watch_task) = if config.live_reload {
            let live_reload = LiveReload::new();
            let changes = Watcher::new(&config.root, &[], config.debounce)?.start()?;
            let task = live_reload.spawn(changes);
            (Some(live_reload), Some(task))
        } else {
            (None, None)
        };

        let state = Arc::new(AppState { live_reload });
        let router = app::create_router(&config.root, Arc::clone(&state));

        tracing::info!(address = %addr, root = %config.root.display(), "Server listening");

        Ok(Self {
            listener,
            addr,
            router,
            state,
            watch_task,
        })
    }

    /// Address the server is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Subscribe to reload events, `None` when live reload is disabled.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ReloadEvent>> {
        self.state.live_reload.as_ref().map(LiveReload::subscribe)
    }

    /// Serve requests until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Watch`] if the output directory watch fails and
    /// [`ServerError::Serve`] if the server stops with an I/O error.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let serve = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .into_future();

        let Some(mut watch_task) = self.watch_task else {
            return serve.await.map_err(ServerError::Serve);
        };

        tokio::pin!(serve);
        let result = tokio::select! {
            result = &mut serve => result.map_err(ServerError::Serve),
            Ok(Some(err)) = &mut watch_task => Err(ServerError::Watch(err)),
        };
        watch_task.abort();
        result
    }

    /// Serve requests until Ctrl-C.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn run_until_ctrl_c(self) -> Result<(), ServerError> {
        self.run(shutdown_signal()).await
    }
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
