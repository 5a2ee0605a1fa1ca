use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the inventory service after a successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    DeviceAdded(Uuid),
    DeviceUpdated(Uuid),
    DeviceDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and logs each event. Downstream consumers
/// (notifications, audit trail) hook in here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::DeviceAdded(id) => info!(device_id = %id, "Device added"),
            Event::DeviceUpdated(id) => info!(device_id = %id, "Device updated"),
            Event::DeviceDeleted(id) => info!(device_id = %id, "Device deleted"),
        }
    }

    warn!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::DeviceAdded(Uuid::nil()))
            .await
            .expect("send should succeed while receiver is alive");

        match rx.recv().await {
            Some(Event::DeviceAdded(id)) => assert_eq!(id, Uuid::nil()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::DeviceDeleted(Uuid::nil())).await.is_err());
    }
}
