//! Recursive change watcher for livesrv.
//!
//! Watches the served directory tree and reports every relevant change as a
//! [`ChangeEvent`] classified as [`ChangeKind::Stylesheet`] or
//! [`ChangeKind::Other`]. Hidden entries, VCS and build directories, editor
//! swap files and user-supplied glob patterns are filtered out before the
//! callback runs.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use livesrv_watch::{watch, ChangeKind, WatchOptions};
//!
//! let handle = watch(Path::new("public"), &WatchOptions::default(), |event| {
//!     match event.kind {
//!         ChangeKind::Stylesheet => println!("restyle: {}", event.path.display()),
//!         ChangeKind::Other => println!("reload: {}", event.path.display()),
//!     }
//! })?;
//! // Watching stops when `handle` is dropped.
//! ```

mod event;
mod filter;
mod watcher;

use std::path::PathBuf;

pub use event::{ChangeEvent, ChangeKind, FsEventKind};
pub use filter::IgnoreFilter;
pub use watcher::{DEFAULT_POLL_INTERVAL, WatchBackend, WatchHandle, WatchOptions, watch};

/// Watcher setup error.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The root directory could not be resolved.
    #[error("Cannot watch {}: {source}", .path.display())]
    Root {
        /// Root as given by the caller.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// An ignore pattern is not a valid glob.
    #[error("Invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        /// Offending pattern.
        pattern: String,
        /// Glob parse error.
        source: glob::PatternError,
    },
    /// The notify backend failed.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}
