//! Notification seam for settlement events.
//!
//! Notifications are best-effort: a failing sink never fails the money
//! path. The default sink just logs; production wiring can push to email
//! or a message queue.

use async_trait::async_trait;
use tracing::info;

use crate::core_types::UserId;
use crate::models::{Order, OrderStatus};

/// Event pushed to buyer and seller when an order changes state
#[derive(Debug, Clone)]
pub struct OrderEvent {
    pub order_id: i64,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub status: OrderStatus,
}

impl OrderEvent {
    pub fn from_order(order: &Order, status: OrderStatus) -> Self {
        Self {
            order_id: order.order_id,
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            status,
        }
    }
}

/// Best-effort delivery of order lifecycle events
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn order_event(&self, event: OrderEvent);
}

/// Default sink: structured log lines only
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn order_event(&self, event: OrderEvent) {
        info!(
            order_id = event.order_id,
            buyer_id = event.buyer_id,
            seller_id = event.seller_id,
            status = %event.status,
            "order event"
        );
    }
}
