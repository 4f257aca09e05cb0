use tokio::sync::broadcast;

use crate::model::ChangeEvent;

/// Fan-out channel for local mutation effects. Replaces the DOM custom-event
/// bus of browser clients with a typed broadcast channel; dropping a receiver
/// unsubscribes it.
#[derive(Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Send is fire-and-forget: a bus with no live subscribers drops events.
    pub fn send(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeAction, ChangePayload, EntityKind};

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let bus = ChangeBus::new(8);
        let mut rx = bus.subscribe();

        for id in ["a", "b"] {
            bus.send(ChangeEvent {
                kind: EntityKind::Document,
                action: ChangeAction::Delete,
                payload: ChangePayload::Delete { id: id.into() },
            });
        }

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.payload, ChangePayload::Delete { id: "a".into() });
        assert_eq!(second.payload, ChangePayload::Delete { id: "b".into() });
    }

    #[test]
    fn send_without_subscribers_is_harmless() {
        let bus = ChangeBus::default();
        bus.send(ChangeEvent {
            kind: EntityKind::Folder,
            action: ChangeAction::Delete,
            payload: ChangePayload::Delete { id: "f1".into() },
        });
    }
}
