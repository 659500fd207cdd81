use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::models::order::OrderStatus;

/// Domain events emitted by the engine after a successful commit. Hosts
/// consume these for dashboards, webhooks or background work; a full
/// channel never blocks or fails a save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderUpdated {
        order_id: Uuid,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    PaymentInvalidated {
        order_id: Uuid,
    },
    ApprovalRequested {
        order_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging and swallowing delivery failures. Event
    /// delivery is best-effort and never aborts the operation that emitted
    /// it.
    pub async fn send_logged(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Failed to deliver engine event");
        }
    }
}

/// Builds an event channel pair with the given buffer capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_channel() {
        let (sender, mut rx) = channel(8);
        let order_id = Uuid::new_v4();
        sender.send(Event::OrderUpdated { order_id }).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderUpdated { order_id: got }) => assert_eq!(got, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_logged_swallows_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        // Must not panic or propagate.
        sender
            .send_logged(Event::ApprovalRequested {
                order_id: Uuid::new_v4(),
            })
            .await;
    }
}
