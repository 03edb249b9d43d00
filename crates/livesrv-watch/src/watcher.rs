//! Recursive watcher over the served root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};

use crate::WatchError;
use crate::event::{ChangeEvent, FsEventKind};
use crate::filter::IgnoreFilter;

/// Default polling interval, also the worst case detection latency in poll mode.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1407);

/// Watcher settings.
#[derive(Clone, Debug)]
pub struct WatchOptions {
    /// Skip native events and poll the tree.
    pub poll: bool,
    /// Poll interval (used in poll mode and as native fallback).
    pub poll_interval: Duration,
    /// Extra glob patterns to ignore.
    pub ignore: Vec<String>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            ignore: Vec::new(),
        }
    }
}

/// Backend that ended up watching the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchBackend {
    /// Native OS notifications (inotify, `FSEvents`, `ReadDirectoryChangesW`).
    Native,
    /// Periodic scan of modification times.
    Poll,
}

type Callback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Handle to a running watcher.
///
/// Uses RAII pattern - dropping the handle stops watching.
pub struct WatchHandle {
    _watcher: Box<dyn Watcher + Send>,
    backend: WatchBackend,
    root: PathBuf,
}

impl WatchHandle {
    /// Backend in use.
    #[must_use]
    pub fn backend(&self) -> WatchBackend {
        self.backend
    }

    /// Canonical root being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching immediately (consumes the handle).
    pub fn stop(self) {}
}

/// Start watching `root` recursively.
///
/// `on_change` runs on the watcher's own thread once per detected change,
/// without batching. It must not block for long.
///
/// Native notifications are preferred. If they cannot be set up (for example
/// when the inotify watch limit is exhausted) the watcher falls back to
/// polling every `options.poll_interval`.
///
/// # Errors
///
/// Returns an error if the root cannot be resolved, an ignore pattern is
/// invalid, or neither backend can watch the tree.
pub fn watch<F>(
    root: &Path,
    options: &WatchOptions,
    on_change: F,
) -> Result<WatchHandle, WatchError>
where
    F: Fn(ChangeEvent) + Send + Sync + 'static,
{
    let root = std::fs::canonicalize(root).map_err(|source| WatchError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    let filter = Arc::new(IgnoreFilter::new(&options.ignore)?);
    let callback: Callback = Arc::new(on_change);

    if !options.poll {
        match start_native(&root, &filter, &callback) {
            Ok(watcher) => {
                tracing::debug!(root = %root.display(), "Watching with native events");
                return Ok(WatchHandle {
                    _watcher: Box::new(watcher),
                    backend: WatchBackend::Native,
                    root,
                });
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Native file watching unavailable, falling back to polling"
                );
            }
        }
    }

    let watcher = start_poll(&root, options.poll_interval, &filter, &callback)?;
    tracing::debug!(
        root = %root.display(),
        interval = ?options.poll_interval,
        "Watching by polling"
    );

    Ok(WatchHandle {
        _watcher: Box::new(watcher),
        backend: WatchBackend::Poll,
        root,
    })
}

fn start_native(
    root: &Path,
    filter: &Arc<IgnoreFilter>,
    callback: &Callback,
) -> Result<RecommendedWatcher, notify::Error> {
    let mut watcher = notify::recommended_watcher(handler(root, filter, callback))?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn start_poll(
    root: &Path,
    interval: Duration,
    filter: &Arc<IgnoreFilter>,
    callback: &Callback,
) -> Result<PollWatcher, WatchError> {
    let config = notify::Config::default().with_poll_interval(interval);
    let mut watcher = PollWatcher::new(handler(root, filter, callback), config)?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

/// Build the notify event handler shared by both backends.
fn handler(
    root: &Path,
    filter: &Arc<IgnoreFilter>,
    callback: &Callback,
) -> impl Fn(notify::Result<Event>) + Send + 'static {
    let root = root.to_path_buf();
    let filter = Arc::clone(filter);
    let callback = Arc::clone(callback);

    move |res: notify::Result<Event>| match res {
        Ok(event) => dispatch(&event, &root, &filter, callback.as_ref()),
        // Errors are per path; the rest of the tree keeps being watched
        Err(e) => tracing::warn!(error = %e, paths = ?e.paths, "File watcher error"),
    }
}

/// Filter a raw notify event and forward one change per remaining path.
fn dispatch(
    event: &Event,
    root: &Path,
    filter: &IgnoreFilter,
    callback: &(dyn Fn(ChangeEvent) + Send + Sync),
) {
    let Some(fs_kind) = FsEventKind::from_notify(&event.kind) else {
        return;
    };

    for path in &event.paths {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if filter.is_ignored(relative) {
            continue;
        }
        // Directory mtime bumps accompany the child's own event
        if fs_kind == FsEventKind::Modified && path.is_dir() {
            continue;
        }

        tracing::debug!(path = %path.display(), ?fs_kind, "Detected change");
        callback(ChangeEvent::new(path.clone(), fs_kind));
    }
}
