//! Lifecycle event stream
//!
//! Every externally relevant fact the coordinator records is also published
//! on a broadcast channel. Subscribers (the persistence writer, metrics,
//! operator tooling) get an at-least-once feed; a lagging subscriber drops
//! the oldest events rather than blocking the coordinator.

use crate::escrow::EscrowId;
use crate::order::OrderId;
use crate::types::{Account, ChainId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SwapEvent {
    OrderCreated {
        order_id: OrderId,
        direction: String,
        making_amount: u128,
        taking_amount: u128,
    },
    OrderAccepted {
        order_id: OrderId,
        resolver: Account,
        rate: u128,
    },
    EscrowCreated {
        order_id: OrderId,
        chain_id: ChainId,
        escrow_id: EscrowId,
    },
    EscrowsReady {
        order_id: OrderId,
    },
    SecretRevealed {
        order_id: OrderId,
    },
    OrderCompleted {
        order_id: OrderId,
    },
    OrderCancelled {
        order_id: OrderId,
        reason: String,
    },
    OrderFailed {
        order_id: OrderId,
        reason: String,
    },
}

impl SwapEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SwapEvent::OrderCreated { .. } => "order_created",
            SwapEvent::OrderAccepted { .. } => "order_accepted",
            SwapEvent::EscrowCreated { .. } => "escrow_created",
            SwapEvent::EscrowsReady { .. } => "escrows_ready",
            SwapEvent::SecretRevealed { .. } => "secret_revealed",
            SwapEvent::OrderCompleted { .. } => "order_completed",
            SwapEvent::OrderCancelled { .. } => "order_cancelled",
            SwapEvent::OrderFailed { .. } => "order_failed",
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            SwapEvent::OrderCreated { order_id, .. }
            | SwapEvent::OrderAccepted { order_id, .. }
            | SwapEvent::EscrowCreated { order_id, .. }
            | SwapEvent::EscrowsReady { order_id }
            | SwapEvent::SecretRevealed { order_id }
            | SwapEvent::OrderCompleted { order_id }
            | SwapEvent::OrderCancelled { order_id, .. }
            | SwapEvent::OrderFailed { order_id, .. } => *order_id,
        }
    }
}

/// Broadcast fan-out for [`SwapEvent`]s
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SwapEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Delivery needs at least one live subscriber;
    /// without one the event is dropped, which is fine - the coordinator's
    /// own state is the source of truth, the stream is advisory.
    pub fn publish(&self, event: SwapEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SwapEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let order_id = Uuid::new_v4();

        bus.publish(SwapEvent::EscrowsReady { order_id });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "escrows_ready");
        assert_eq!(event.order_id(), order_id);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(SwapEvent::OrderCompleted {
            order_id: Uuid::new_v4(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
