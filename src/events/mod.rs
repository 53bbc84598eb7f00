use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

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

    /// Sends an event, logging a warning instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

/// Domain events emitted after state changes commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartItemAdded {
        user_id: Uuid,
        item_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        user_id: Uuid,
        item_id: Uuid,
    },
    CartCleared {
        user_id: Uuid,
        removed: u64,
    },

    // Promo events
    PromoCreated {
        promo_id: Uuid,
        code: String,
    },
    PromoRedeemed {
        promo_id: Uuid,
        user_id: Uuid,
    },
    PromoExpired {
        promo_id: Uuid,
        code: String,
    },

    // Inventory events
    InventoryReserved {
        product_id: Uuid,
        quantity: i32,
        remaining: i32,
    },
    InventoryRestocked {
        product_id: Uuid,
        quantity: i32,
    },

    // Order events
    OrderCreated {
        order_id: Uuid,
        user_id: Uuid,
        total_amount: Decimal,
    },
    CourierAssigned {
        order_id: Uuid,
        courier_id: Uuid,
        assigned_at: Option<DateTime<Utc>>,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderDelivered {
        order_id: Uuid,
        delivered_at: DateTime<Utc>,
    },
    OrderDeleted(Uuid),

    // Courier events
    CourierCreated {
        courier_id: Uuid,
        user_id: Uuid,
    },
    CourierUpdated(Uuid),
}

impl Event {
    /// Short stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::CartItemAdded { .. } => "cart.item_added",
            Event::CartItemRemoved { .. } => "cart.item_removed",
            Event::CartCleared { .. } => "cart.cleared",
            Event::PromoCreated { .. } => "promo.created",
            Event::PromoRedeemed { .. } => "promo.redeemed",
            Event::PromoExpired { .. } => "promo.expired",
            Event::InventoryReserved { .. } => "inventory.reserved",
            Event::InventoryRestocked { .. } => "inventory.restocked",
            Event::OrderCreated { .. } => "order.created",
            Event::CourierAssigned { .. } => "order.courier_assigned",
            Event::OrderStatusChanged { .. } => "order.status_changed",
            Event::OrderDelivered { .. } => "order.delivered",
            Event::OrderDeleted(_) => "order.deleted",
            Event::CourierCreated { .. } => "courier.created",
            Event::CourierUpdated(_) => "courier.updated",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(event = event.name(), %payload, "domain event"),
            Err(e) => error!(event = event.name(), "Failed to serialize event: {}", e),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let event = Event::OrderCreated {
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_amount: dec!(162.00),
        };

        sender.send(event.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(event));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::OrderDeleted(Uuid::nil())).await.is_err());
        sender.send_or_log(Event::OrderDeleted(Uuid::nil())).await;
    }
}
