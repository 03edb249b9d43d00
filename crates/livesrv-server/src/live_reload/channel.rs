//! Fan-out of reload signals to connected pages.

use livesrv_watch::ChangeKind;
use tokio::sync::broadcast;

/// Greeting sent to every client right after the handshake.
pub const CONNECTED: &str = "connected";

/// Pending signals per client before it is considered lagging.
const CHANNEL_CAPACITY: usize = 100;

/// Instruction sent to connected pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadSignal {
    /// Reload the whole page.
    Reload,
    /// Re-fetch stylesheets without reloading.
    RefreshCss,
}

impl ReloadSignal {
    /// Signal for a change of the given kind.
    #[must_use]
    pub fn for_change(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Stylesheet => Self::RefreshCss,
            ChangeKind::Other => Self::Reload,
        }
    }

    /// Text frame payload understood by the injected client.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::RefreshCss => "refreshcss",
        }
    }
}

/// Set of live reload clients.
///
/// Cloning is cheap; all clones share the same set. A client belongs to the
/// set while its socket task holds a subscription.
#[derive(Clone, Debug)]
pub struct ReloadChannel {
    sender: broadcast::Sender<ReloadSignal>,
}

impl ReloadChannel {
    /// Create an empty channel.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Send `signal` to every connected client.
    ///
    /// Returns the number of clients it was queued for. With no clients
    /// this is a no-op returning 0.
    pub fn broadcast(&self, signal: ReloadSignal) -> usize {
        self.sender.send(signal).unwrap_or(0)
    }

    /// Number of connected clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ReloadSignal> {
        self.sender.subscribe()
    }
}

impl Default for ReloadChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_wire_text() {
        assert_eq!(ReloadSignal::Reload.as_str(), "reload");
        assert_eq!(ReloadSignal::RefreshCss.as_str(), "refreshcss");
    }

    #[test]
    fn test_signal_for_change() {
        assert_eq!(
            ReloadSignal::for_change(ChangeKind::Stylesheet),
            ReloadSignal::RefreshCss
        );
        assert_eq!(
            ReloadSignal::for_change(ChangeKind::Other),
            ReloadSignal::Reload
        );
    }

    #[test]
    fn test_broadcast_without_clients_is_noop() {
        let channel = ReloadChannel::new();
        assert_eq!(channel.client_count(), 0);
        assert_eq!(channel.broadcast(ReloadSignal::Reload), 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_client() {
        let channel = ReloadChannel::new();
        let mut clients: Vec<_> = (0..3).map(|_| channel.subscribe()).collect();
        assert_eq!(channel.client_count(), 3);

        assert_eq!(channel.broadcast(ReloadSignal::RefreshCss), 3);

        for client in &mut clients {
            assert_eq!(client.recv().await.unwrap(), ReloadSignal::RefreshCss);
        }
    }

    #[tokio::test]
    async fn test_signals_arrive_in_order() {
        let channel = ReloadChannel::new();
        let mut client = channel.subscribe();

        channel.broadcast(ReloadSignal::RefreshCss);
        channel.broadcast(ReloadSignal::Reload);

        assert_eq!(client.recv().await.unwrap(), ReloadSignal::RefreshCss);
        assert_eq!(client.recv().await.unwrap(), ReloadSignal::Reload);
    }

    #[test]
    fn test_dropped_client_leaves_set() {
        let channel = ReloadChannel::new();
        let client = channel.subscribe();
        let clone = channel.clone();
        assert_eq!(clone.client_count(), 1);

        drop(client);

        assert_eq!(channel.client_count(), 0);
        assert_eq!(clone.broadcast(ReloadSignal::Reload), 0);
    }
}
