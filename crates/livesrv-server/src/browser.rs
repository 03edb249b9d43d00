//! Default browser launch.

/// Open `url` in the user's default browser without waiting for it.
///
/// Failures are logged; the server keeps running either way.
pub fn open_browser(url: &str) {
    match open::that_detached(url) {
        Ok(()) => tracing::debug!(url, "Opened browser"),
        Err(e) => tracing::warn!(error = %e, url, "Failed to open browser"),
    }
}
