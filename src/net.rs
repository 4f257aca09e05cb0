use std::sync::Arc;

use tokio::sync::watch;

/// Network-availability signal injected into the queue, so it never depends
/// on any particular runtime's online/offline events.
pub trait NetworkMonitor: Send + Sync {
    fn is_online(&self) -> bool;

    /// Watch channel carrying the current online flag; the queue subscribes
    /// once at startup.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// Hand-driven monitor: hosts wire their runtime's connectivity signal into
/// `set_online`, and tests flip it directly.
#[derive(Clone)]
pub struct ManualNetwork {
    tx: Arc<watch::Sender<bool>>,
}

impl ManualNetwork {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_replace(online);
    }
}

impl NetworkMonitor for ManualNetwork {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transitions_reach_watchers() {
        let net = ManualNetwork::new(true);
        assert!(net.is_online());

        let mut rx = net.watch();
        net.set_online(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
        assert!(!net.is_online());
    }
}
