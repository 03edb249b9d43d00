//! Error types for the HTTP server.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Per-request error.
///
/// Isolated to the request that raised it; the server keeps running.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// Request path tries to leave the root directory.
    #[error("Forbidden path: {0}")]
    Forbidden(String),

    /// Request path cannot be decoded.
    #[error("Malformed path: {0}")]
    BadRequest(String),

    /// File system failure other than "not found".
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ServerError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let reason = status.canonical_reason().unwrap_or_default();
        (status, reason).into_response()
    }
}

/// Startup error. Fatal: the server never starts accepting connections.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Root directory cannot be resolved.
    #[error("Root directory {}: {source}", .path.display())]
    Root {
        /// Root as configured.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Root exists but is not a directory.
    #[error("Root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Reload client payload cannot be loaded.
    #[error("{0}")]
    Payload(#[from] livesrv_assets::AssetError),

    /// File watcher cannot be started.
    #[error("{0}")]
    Watch(#[from] livesrv_watch::WatchError),

    /// Listening socket cannot be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested `host:port`.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Server loop failed.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
