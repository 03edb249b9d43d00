//! Static file serving from the root directory.
//!
//! Maps a request path onto a file under the root, redirects directories
//! requested without a trailing slash, serves `index.html` for directories,
//! and streams the file through [`PendingResponse`] so the reload client can
//! be prepended. Anything that cannot be resolved falls through to the
//! next handler.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::Response;
use percent_encoding::percent_decode_str;
use tokio::fs::File;

use crate::error::ServerError;
use crate::inject::{PendingResponse, is_injectable};
use crate::state::AppState;

/// File served for a directory request.
pub(crate) const INDEX_FILE: &str = "index.html";

/// Serve the file addressed by `uri_path`.
///
/// Returns `Ok(None)` when the request should fall through: method other
/// than `GET`/`HEAD`, missing file, a file addressed with a trailing slash,
/// or a directory without an index. `HEAD` opens the file like `GET` does,
/// so both agree on unreadable files.
pub(crate) async fn serve(
    state: &AppState,
    method: &Method,
    uri_path: &str,
) -> Result<Option<Response>, ServerError> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(None);
    }

    let requested = state.root.join(sanitize(uri_path)?);
    let Some((path, meta)) = locate(&state.root, &requested).await? else {
        return Ok(None);
    };

    let (path, meta) = if meta.is_dir() {
        if !uri_path.ends_with('/') {
            return redirect(uri_path).map(Some);
        }
        match locate(&state.root, &path.join(INDEX_FILE)).await? {
            Some((index, index_meta)) if index_meta.is_file() => (index, index_meta),
            _ => return Ok(None),
        }
    } else if uri_path.ends_with('/') {
        return Ok(None);
    } else {
        (path, meta)
    };

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if is_missing(&e) => return Ok(None),
        Err(e) => return Err(ServerError::io(&path, e)),
    };

    let payload = state
        .payload
        .as_ref()
        .filter(|_| is_injectable(&path))
        .cloned();
    let pending = PendingResponse::new(meta.len(), livesrv_assets::mime_for(&path), payload);

    tracing::debug!(
        path = %path.display(),
        bytes = pending.content_length(),
        "Serving file"
    );

    if method == Method::HEAD {
        return Ok(Some(pending.into_head()));
    }
    Ok(Some(pending.into_response(file)))
}

/// Decode a request path into a root-relative path.
///
/// Empty and `.` segments are dropped. Parent segments, NUL bytes and
/// anything that is not a plain file name are rejected.
pub(crate) fn sanitize(uri_path: &str) -> Result<PathBuf, ServerError> {
    let decoded = percent_decode_str(uri_path)
        .decode_utf8()
        .map_err(|_| ServerError::BadRequest(uri_path.to_owned()))?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains('\0') || segment.contains('\\') {
            return Err(ServerError::Forbidden(uri_path.to_owned()));
        }

        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => relative.push(name),
            _ => return Err(ServerError::Forbidden(uri_path.to_owned())),
        }
    }

    Ok(relative)
}

/// Resolve `path` (following symlinks) and confirm it stays under `root`.
///
/// `root` must already be canonical. Returns `None` if nothing exists there.
pub(crate) async fn locate(
    root: &Path,
    path: &Path,
) -> Result<Option<(PathBuf, Metadata)>, ServerError> {
    let canonical = match tokio::fs::canonicalize(path).await {
        Ok(canonical) => canonical,
        Err(e) if is_missing(&e) => return Ok(None),
        Err(e) => return Err(ServerError::io(path, e)),
    };

    if !canonical.starts_with(root) {
        return Err(ServerError::Forbidden(path.display().to_string()));
    }

    match tokio::fs::metadata(&canonical).await {
        Ok(meta) => Ok(Some((canonical, meta))),
        Err(e) if is_missing(&e) => Ok(None),
        Err(e) => Err(ServerError::io(&canonical, e)),
    }
}

/// Errors that mean "nothing there" rather than a server failure.
pub(crate) fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Permanent redirect to the slash-terminated form of `uri_path`.
fn redirect(uri_path: &str) -> Result<Response, ServerError> {
    let target = format!("{uri_path}/");
    let location =
        HeaderValue::from_str(&target).map_err(|_| ServerError::BadRequest(target.clone()))?;
    let body = format!("Redirecting to {}", html_escape::encode_text(&target));

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    Ok(response)
}
