//! Static assets for the livesrv development server.
//!
//! Provides the reload client payload that gets prepended to HTML responses
//! and the MIME lookup used when serving files:
//!
//! - **Bundled payload**: compiled into the binary from `assets/injected.html`
//! - **Custom payload**: read once from a user-supplied file at startup

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Reload client bundled with the binary.
pub const BUNDLED_PAYLOAD: &str = include_str!("../assets/injected.html");

/// Asset loading error.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The custom payload file could not be read.
    #[error("Failed to read inject file {}: {source}", .path.display())]
    Read {
        /// Path of the payload file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Load the reload client payload.
///
/// Returns the bundled payload when `custom` is `None`, otherwise the contents
/// of the given file. The result is meant to be loaded once at startup and
/// reused for every response, so its length stays constant.
pub fn load_payload(custom: Option<&Path>) -> Result<Cow<'static, [u8]>, AssetError> {
    let Some(path) = custom else {
        return Ok(Cow::Borrowed(BUNDLED_PAYLOAD.as_bytes()));
    };

    std::fs::read(path)
        .map(Cow::Owned)
        .map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Return the `Content-Type` value for the given file path.
///
/// Textual types carry an explicit UTF-8 charset. Unknown extensions map to
/// `application/octet-stream`.
pub fn mime_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let textual = mime.type_() == mime_guess::mime::TEXT
        || mime.subtype() == mime_guess::mime::JAVASCRIPT
        || mime.subtype() == mime_guess::mime::JSON;

    if textual && mime.get_param(mime_guess::mime::CHARSET).is_none() {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}
