//! Change event types produced by the watcher.

use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::{MetadataKind, ModifyKind, RenameMode};

/// How connected pages should react to a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// A stylesheet changed; pages can swap styles in place.
    Stylesheet,
    /// Anything else changed, including additions and removals.
    Other,
}

impl ChangeKind {
    /// Classify a changed path by its extension.
    ///
    /// `.css` (in any letter case) is a stylesheet; everything else is `Other`.
    #[must_use]
    pub fn classify(path: &Path) -> Self {
        let is_css = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
        if is_css {
            Self::Stylesheet
        } else {
            Self::Other
        }
    }
}

/// Kind of file system change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsEventKind {
    /// Path was created (or renamed into place).
    Created,
    /// Path contents or metadata changed.
    Modified,
    /// Path was removed (or renamed away).
    Removed,
}

impl FsEventKind {
    /// Map a notify event kind, returning `None` for events that do not
    /// change anything a browser could see (reads, access time updates).
    pub(crate) fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            // Close-after-write always follows a modify event for the same write
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime))
            | EventKind::Access(_)
            | EventKind::Other => None,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(Self::Removed),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(Self::Created),
            EventKind::Modify(_) | EventKind::Any => Some(Self::Modified),
        }
    }
}

/// A single detected change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path of the changed entry.
    pub path: PathBuf,
    /// Reload classification.
    pub kind: ChangeKind,
    /// Underlying file system change.
    pub fs_kind: FsEventKind,
}

impl ChangeEvent {
    /// Create an event, classifying the path.
    #[must_use]
    pub fn new(path: PathBuf, fs_kind: FsEventKind) -> Self {
        let kind = ChangeKind::classify(&path);
        Self {
            path,
            kind,
            fs_kind,
        }
    }
}
