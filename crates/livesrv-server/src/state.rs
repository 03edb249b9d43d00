//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;

use axum::body::Bytes;

use crate::live_reload::ReloadChannel;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Canonical root directory.
    pub(crate) root: PathBuf,
    /// Reload client prepended to injectable files (`None` disables live reload).
    pub(crate) payload: Option<Bytes>,
    /// Connected live reload clients.
    pub(crate) reload: ReloadChannel,
}

impl AppState {
    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.payload.is_some()
    }
}
