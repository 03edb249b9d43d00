//! Development HTTP server with live reload.
//!
//! Serves a directory over HTTP and keeps open pages in sync with it:
//! - Static files, with `index.html` for directories and a listing otherwise
//! - A reload client prepended to HTML responses
//! - A WebSocket endpoint (any path) that tells pages to reload or restyle
//! - A recursive file watcher feeding that endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use livesrv_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::from_positional(Some(3000), Some("public".into()), None, None);
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum dispatcher
//!    ▲                  │
//!    │                  ├─► WebSocket upgrade ──► ReloadChannel (broadcast)
//!    │                  │                              ▲
//!    │                  ├─► Static files (+ reload client)
//!    │                  │                              │
//!    │                  └─► Directory listing / 404    │
//!    │                                                 │
//!    └──── "reload" / "refreshcss" ◄── livesrv-watch ──┘
//! ```

mod app;
mod browser;
mod error;
mod inject;
mod listing;
mod live_reload;
mod state;
mod static_files;

use std::borrow::Cow;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use livesrv_watch::{ChangeEvent, ChangeKind, WatchHandle, WatchOptions};
use tokio::net::TcpListener;

pub use browser::open_browser;
pub use error::StartupError;
pub use live_reload::{CONNECTED, ReloadChannel, ReloadSignal};

use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host name or address to bind to.
    pub host: String,
    /// Port to listen on (0 picks a free port).
    pub port: u16,
    /// Directory to serve.
    pub root_dir: PathBuf,
    /// Open the default browser once listening.
    pub open_browser: bool,
    /// Inject the reload client and watch for changes.
    pub live_reload_enabled: bool,
    /// Replacement for the bundled reload client.
    pub inject_file: Option<PathBuf>,
    /// File watcher settings.
    pub watch: WatchOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8080,
            root_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            open_browser: true,
            live_reload_enabled: true,
            inject_file: None,
            watch: WatchOptions::default(),
        }
    }
}

impl ServerConfig {
    /// Build a configuration from optional positional values, defaulting the
    /// rest.
    #[must_use]
    pub fn from_positional(
        port: Option<u16>,
        root_dir: Option<PathBuf>,
        suppress_browser: Option<bool>,
        host: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            host: host.unwrap_or(defaults.host),
            port: port.unwrap_or(defaults.port),
            root_dir: root_dir.unwrap_or(defaults.root_dir),
            open_browser: !suppress_browser.unwrap_or(false),
            ..defaults
        }
    }
}

/// Create server configuration from a loaded livesrv configuration.
#[must_use]
pub fn server_config_from_config(config: &livesrv_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root_dir: config.root_dir.clone(),
        open_browser: config.server.open_browser,
        live_reload_enabled: config.live_reload.enabled,
        inject_file: config.inject_file.clone(),
        watch: WatchOptions {
            poll: config.watch.poll,
            poll_interval: Duration::from_millis(config.watch.interval_ms),
            ignore: config.watch.ignore.clone(),
        },
    }
}

/// A bound, not yet serving, live reload server.
///
/// Binding and serving are separate so callers can learn the actual address
/// (for example with port 0) before requests are accepted.
pub struct LiveServer {
    listener: TcpListener,
    router: Router,
    reload: ReloadChannel,
    root: PathBuf,
    url: String,
    open_browser: bool,
    _watcher: Option<WatchHandle>,
}

impl LiveServer {
    /// Resolve the root, load the reload client, start watching and bind.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a readable directory, the custom
    /// reload client cannot be read, the watcher cannot start, or the
    /// address cannot be bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, StartupError> {
        let root = resolve_root(&config.root_dir).await?;
        let reload = ReloadChannel::new();

        let (payload, watcher) = if config.live_reload_enabled {
            let payload = livesrv_assets::load_payload(config.inject_file.as_deref())?;
            let watcher = livesrv_watch::watch(&root, &config.watch, forward_changes(&reload))?;
            let payload = match payload {
                Cow::Borrowed(bytes) => Bytes::from_static(bytes),
                Cow::Owned(bytes) => Bytes::from(bytes),
            };
            (Some(payload), Some(watcher))
        } else {
            (None, None)
        };

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| StartupError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let port = listener
            .local_addr()
            .map_err(|source| StartupError::Bind { addr, source })?
            .port();

        let state = Arc::new(AppState {
            root: root.clone(),
            payload,
            reload: reload.clone(),
        });

        Ok(Self {
            listener,
            router: app::create_router(state),
            reload,
            root,
            url: format!("http://{}:{port}", config.host),
            open_browser: config.open_browser,
            _watcher: watcher,
        })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Base URL, using the configured host name.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Canonical root directory being served.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle for broadcasting to connected pages.
    #[must_use]
    pub fn reload_channel(&self) -> ReloadChannel {
        self.reload.clone()
    }

    /// Whether the configuration asked for a browser window.
    #[must_use]
    pub fn wants_browser(&self) -> bool {
        self.open_browser
    }

    /// Human-readable startup line.
    #[must_use]
    pub fn banner(&self) -> String {
        format!("Serving \"{}\" at {}", self.root.display(), self.url)
    }

    /// Serve until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve(self) -> Result<(), StartupError> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `signal` completes, then drain open connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            listener,
            router,
            _watcher: watcher,
            ..
        } = self;

        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(StartupError::Serve)?;

        drop(watcher);
        Ok(())
    }
}

/// Run the server: bind, announce, optionally open a browser, then serve
/// until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), StartupError> {
    let server = LiveServer::bind(config).await?;
    tracing::info!(root = %server.root().display(), url = server.url(), "{}", server.banner());

    if server.wants_browser() {
        open_browser(server.url());
    }

    server.serve().await
}

async fn resolve_root(root_dir: &Path) -> Result<PathBuf, StartupError> {
    let root = tokio::fs::canonicalize(root_dir)
        .await
        .map_err(|source| StartupError::Root {
            path: root_dir.to_path_buf(),
            source,
        })?;

    let meta = tokio::fs::metadata(&root)
        .await
        .map_err(|source| StartupError::Root {
            path: root_dir.to_path_buf(),
            source,
        })?;
    if !meta.is_dir() {
        return Err(StartupError::NotADirectory(root));
    }

    Ok(root)
}

/// Watcher callback turning each change into a broadcast.
fn forward_changes(reload: &ReloadChannel) -> impl Fn(ChangeEvent) + Send + Sync + 'static {
    let reload = reload.clone();
    move |event| {
        let clients = reload.broadcast(ReloadSignal::for_change(event.kind));
        match event.kind {
            ChangeKind::Stylesheet => {
                tracing::info!(path = %event.path.display(), clients, "CSS change detected");
            }
            ChangeKind::Other => {
                tracing::info!(path = %event.path.display(), clients, "File change detected");
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
