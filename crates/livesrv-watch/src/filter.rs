//! Ignore rules for watched paths.
//!
//! Paths are checked relative to the watched root. An entry is ignored when
//! any of its components is hidden, when it sits inside a common VCS or
//! build directory, when its file name looks like an editor or OS artifact,
//! or when it matches one of the user-supplied glob patterns.

use std::path::{Component, Path};

use glob::Pattern;

use crate::WatchError;

/// Directories whose contents never affect a served page.
const NOISE_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    "CVS",
    "target",
    "__pycache__",
];

/// File names dropped by operating systems.
const NOISE_FILES: &[&str] = &["Thumbs.db", "desktop.ini"];

/// Suffixes used by editors for swap and backup files.
const TEMP_SUFFIXES: &[&str] = &["~", ".swp", ".swx", ".swo", ".tmp"];

/// Decides which changed paths are reported.
#[derive(Clone, Debug, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    /// Create a filter with the built-in rules plus extra glob patterns.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::Pattern` if any pattern is not a valid glob.
    pub fn new(patterns: &[String]) -> Result<Self, WatchError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| WatchError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { patterns })
    }

    /// Check whether a root-relative path should be ignored.
    ///
    /// The empty path (the root itself) is ignored.
    #[must_use]
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let names: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_str().unwrap_or_default()),
                _ => None,
            })
            .collect();

        let Some(file_name) = names.last() else {
            return true;
        };

        if names.iter().any(|name| name.starts_with('.')) {
            return true;
        }

        // Also matches the directory itself, which may already be gone
        if names.iter().any(|name| NOISE_DIRS.contains(name)) {
            return true;
        }

        if NOISE_FILES.contains(file_name)
            || TEMP_SUFFIXES
                .iter()
                .any(|suffix| file_name.ends_with(suffix))
        {
            return true;
        }

        self.patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative))
    }
}
