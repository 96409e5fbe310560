//! Orders
//!
//! `NewOrder` is the exact wire payload of the create-order operation.
//! `PendingOrder` wraps it with the local-only bookkeeping fields needed
//! while the write sits in the offline queue. Keeping the two as separate
//! types makes payload sanitization structural: the wire type simply has no
//! temporary identifier, `offline` flag or timestamp to leak.

use serde::{Deserialize, Serialize};

use super::temp_id;

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product SKU
    pub sku: String,
    /// Quantity ordered
    pub qty: u32,
}

/// Wire payload of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Name of the client receiving the order
    pub client_name: String,
    /// Store the order is placed against
    pub store_id: i64,
    /// Ordered items
    pub items: Vec<OrderItem>,
}

/// An order acknowledged by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Server-assigned identifier
    pub id: i64,
    /// Name of the client receiving the order
    pub client_name: String,
    /// Store the order is placed against
    pub store_id: i64,
    /// Ordered items
    pub items: Vec<OrderItem>,
    /// Server-side status, e.g. `PENDIENTE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// An order created while offline, waiting for acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    /// Locally-generated temporary identifier
    pub temp_id: String,
    /// The payload the create operation will receive
    #[serde(flatten)]
    pub order: NewOrder,
    /// Always true for queued writes
    pub offline: bool,
    /// Creation time, milliseconds since the epoch
    pub timestamp: i64,
}

impl PendingOrder {
    /// Queue a new order, stamping the local-only fields
    pub fn new(order: NewOrder) -> Self {
        Self {
            temp_id: temp_id("offline"),
            order,
            offline: true,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Strip the local-only fields down to the wire payload
    pub fn wire_payload(&self) -> NewOrder {
        self.order.clone()
    }
}
