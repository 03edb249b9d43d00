//! Router construction.
//!
//! Every request goes through a single dispatcher: WebSocket upgrades join
//! the live reload channel, everything else is tried as a static file and
//! then handed to the listing/404 fallback.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::listing;
use crate::live_reload;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    method: Method,
    uri: Uri,
) -> Response {
    if let Ok(ws) = upgrade
        && state.live_reload_enabled()
    {
        return live_reload::upgrade(ws, state.reload.clone());
    }

    match static_files::serve(&state, &method, uri.path()).await {
        Ok(Some(response)) => response,
        Ok(None) => listing::fallback(&state, &method, uri.path()).await,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{Body, Bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::live_reload::ReloadChannel;

    fn router(root: &std::path::Path, payload: Option<&'static str>) -> Router {
        create_router(Arc::new(AppState {
            root: std::fs::canonicalize(root).unwrap(),
            payload: payload.map(|p| Bytes::from_static(p.as_bytes())),
            reload: ReloadChannel::new(),
        }))
    }

    async fn get(router: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_serves_index_with_payload() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>home</p>").unwrap();

        let (status, body) = get(router(dir.path(), Some("<!--lr-->")), Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<!--lr--><p>home</p>");
    }

    #[tokio::test]
    async fn test_no_payload_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>home</p>").unwrap();

        let (_, body) = get(router(dir.path(), None), Method::GET, "/index.html").await;

        assert_eq!(body, "<p>home</p>");
    }

    #[tokio::test]
    async fn test_post_falls_through_to_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "x").unwrap();

        let (status, _) = get(router(dir.path(), None), Method::POST, "/index.html").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_trailing_slash_on_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("index.html"), "x").unwrap();
        std::fs::write(dir.path().join("docs").join("guide.html"), "g").unwrap();

        for uri in ["/index.html/", "/docs/guide.html/"] {
            for method in [Method::GET, Method::HEAD] {
                let (status, _) = get(router(dir.path(), None), method, uri).await;
                assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_fails_for_head_and_get() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.html");
        std::fs::write(&path, "secret").unwrap();
        let locked = std::fs::Permissions::from_mode(0o000);
        std::fs::set_permissions(&path, locked).unwrap();
        if std::fs::File::open(&path).is_ok() {
            // Privileged users bypass file modes
            return;
        }

        for method in [Method::GET, Method::HEAD] {
            let (status, body) = get(router(dir.path(), None), method, "/locked.html").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!body.contains("secret"));
        }
    }

    #[tokio::test]
    async fn test_head_on_file_has_length_and_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<p>x</p>").unwrap();

        let response = router(dir.path(), Some("<!--lr-->"))
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/page.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "17");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_without_live_reload_is_a_plain_request() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(dir.path(), None)
            .oneshot(
                Request::builder()
                    .uri("/__livesrv")
                    .header(header::CONNECTION, "upgrade")
                    .header(header::UPGRADE, "websocket")
                    .header(header::SEC_WEBSOCKET_VERSION, "13")
                    .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
