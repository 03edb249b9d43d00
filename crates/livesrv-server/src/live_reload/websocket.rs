//! WebSocket handler for live reload.
//!
//! Every upgrade request is accepted regardless of its path. The socket is
//! greeted with `connected` and then receives one text frame per reload
//! signal until either side closes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::broadcast::error::RecvError;

use super::channel::{CONNECTED, ReloadChannel, ReloadSignal};

/// Complete the handshake and attach the socket to `channel`.
pub(crate) fn upgrade(ws: WebSocketUpgrade, channel: ReloadChannel) -> Response {
    ws.on_failed_upgrade(|e: axum::Error| {
        tracing::debug!(error = %e, "Live reload handshake failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, channel))
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, channel: ReloadChannel) {
    let mut receiver = channel.subscribe();

    if socket.send(Message::Text(CONNECTED.into())).await.is_err() {
        return;
    }
    tracing::debug!(
        clients = channel.client_count(),
        "Live reload client connected"
    );

    loop {
        tokio::select! {
            result = receiver.recv() => {
                let signal = match result {
                    Ok(signal) => signal,
                    Err(RecvError::Closed) => break,
                    // Missed signals collapse into one full reload
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Live reload client lagged");
                        ReloadSignal::Reload
                    }
                };
                if socket.send(Message::Text(signal.as_str().into())).await.is_err() {
                    break;
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    // Client messages carry no meaning
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    drop(receiver);
    tracing::debug!(
        clients = channel.client_count(),
        "Live reload client disconnected"
    );
}
