//! Reload client injection into served files.
//!
//! The payload is streamed ahead of the file body rather than spliced into
//! the markup, so files are never buffered. `Content-Length` covers both.

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Extensions that receive the reload client. Files without an extension
/// also qualify.
const INJECTABLE_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "php"];

const CHUNK_SIZE: usize = 64 * 1024;

/// Check whether the reload client should be injected into `path`.
pub(crate) fn is_injectable(path: &Path) -> bool {
    match path.extension() {
        None => true,
        Some(ext) => INJECTABLE_EXTENSIONS
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(OsStr::new(candidate))),
    }
}

/// A file response whose headers have not been written yet.
///
/// The payload is fixed at construction, so injection happens at most once
/// and the declared length always includes it.
#[derive(Debug)]
pub(crate) struct PendingResponse {
    file_len: u64,
    content_type: String,
    payload: Option<Bytes>,
}

impl PendingResponse {
    pub(crate) fn new(file_len: u64, content_type: String, payload: Option<Bytes>) -> Self {
        Self {
            file_len,
            content_type,
            payload,
        }
    }

    /// Total bytes the body will carry.
    pub(crate) fn content_length(&self) -> u64 {
        let payload_len = self.payload.as_ref().map_or(0, Bytes::len);
        self.file_len + payload_len as u64
    }

    /// Headers only, for `HEAD` requests.
    pub(crate) fn into_head(self) -> Response {
        self.finish(Body::empty())
    }

    /// Stream the payload followed by at most `file_len` bytes of `file`.
    pub(crate) fn into_response(self, file: File) -> Response {
        let prefix = futures::stream::iter(self.payload.clone().map(Ok::<_, io::Error>));
        let body = Body::from_stream(prefix.chain(file_chunks(file, self.file_len)));
        self.finish(body)
    }

    fn finish(self, body: Body) -> Response {
        let content_length = self.content_length();
        let mut response = Response::new(body);
        *response.status_mut() = StatusCode::OK;

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        response
    }
}

/// Read `file` in chunks, stopping after `limit` bytes even if it grew.
fn file_chunks(file: File, limit: u64) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    futures::stream::try_unfold(file.take(limit), |mut reader| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok::<_, io::Error>(Some((Bytes::from(buf), reader)))
    })
}
