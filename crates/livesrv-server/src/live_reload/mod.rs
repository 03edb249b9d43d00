//! Live reload: the broadcast channel and its WebSocket endpoint.

mod channel;
mod websocket;

pub use channel::{CONNECTED, ReloadChannel, ReloadSignal};
pub(crate) use websocket::upgrade;
