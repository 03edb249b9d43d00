//! Fallback handler: directory listings and 404s.

use std::fmt::Write as _;
use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::ServerError;
use crate::state::AppState;
use crate::static_files::{locate, sanitize};

/// Characters escaped in listing links.
const LINK: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Listing entry.
#[derive(Debug, PartialEq, Eq)]
struct Entry {
    name: String,
    is_dir: bool,
}

/// Handle a request the static responder passed on.
///
/// `GET`/`HEAD` on a directory path ending in `/` lists its visible entries.
/// Everything else is 404.
pub(crate) async fn fallback(state: &AppState, method: &Method, uri_path: &str) -> Response {
    if (method == Method::GET || method == Method::HEAD) && uri_path.ends_with('/') {
        match directory(state, uri_path).await {
            Ok(Some(response)) => return response,
            Ok(None) => {}
            Err(e) => return e.into_response(),
        }
    }

    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

async fn directory(state: &AppState, uri_path: &str) -> Result<Option<Response>, ServerError> {
    let requested = state.root.join(sanitize(uri_path)?);
    let Some((path, meta)) = locate(&state.root, &requested).await? else {
        return Ok(None);
    };
    if !meta.is_dir() {
        return Ok(None);
    }

    let entries = read_entries(&path).await?;
    let html = render(uri_path, &entries);

    let mut body = Vec::with_capacity(html.len());
    if let Some(payload) = &state.payload {
        body.extend_from_slice(payload);
    }
    body.extend_from_slice(html.as_bytes());

    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    Ok(Some(response))
}

/// Visible entries of `dir`, directories first, then by name.
async fn read_entries(dir: &Path) -> Result<Vec<Entry>, ServerError> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ServerError::io(dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| ServerError::io(dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        // Follows symlinks; dangling links are listed as files
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_dir());
        entries.push(Entry { name, is_dir });
    }

    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

fn render(uri_path: &str, entries: &[Entry]) -> String {
    let title = html_escape::encode_text(uri_path);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Index of {title}</title>\n</head>\n<body>\n\
         <h1>Index of {title}</h1>\n<ul>\n"
    );

    if uri_path != "/" {
        html.push_str("<li><a href=\"../\">../</a></li>\n");
    }
    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let href = utf8_percent_encode(&entry.name, LINK).to_string();
        let href = html_escape::encode_double_quoted_attribute(&href);
        let text = html_escape::encode_text(&entry.name);
        let _ = writeln!(
            html,
            "<li><a href=\"{href}{suffix}\">{text}{suffix}</a></li>"
        );
    }

    html.push_str("</ul>\n</body>\n</html>\n");
    html
}
