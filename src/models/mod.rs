//! Domain Models
//!
//! This module contains all the data structures exchanged with the remote
//! gateway or persisted in the local durable store:
//!
//! - `Product` / `Store` - cached reference data, replaced wholesale on fetch
//! - `PendingOrder` / `PendingVisit` - user writes queued while offline
//! - `NewOrder` / `VisitScan` - the wire payloads of the create operations
//! - `User` / `ServerNotification` / `TemporaryAssignment` - gateway records
//!
//! # Usage
//!
//! ```rust
//! use tienda_client::models::{NewOrder, OrderItem, PendingOrder};
//!
//! let order = NewOrder {
//!     client_name: "Ana".to_string(),
//!     store_id: 7,
//!     items: vec![OrderItem { sku: "A1".to_string(), qty: 2 }],
//! };
//! let pending = PendingOrder::new(order);
//! assert!(pending.offline);
//! ```

pub mod assignment;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod user;
pub mod visit;

// Re-export all types
pub use assignment::TemporaryAssignment;
pub use catalog::{NewProduct, NewStore, Product, Store};
pub use notification::{DisplayNotification, PushNotificationPart, PushPayload, ServerNotification};
pub use order::{NewOrder, Order, OrderItem, PendingOrder};
pub use user::{Credentials, LoginResponse, NewUser, Role, User};
pub use visit::{PendingVisit, Visit, VisitScan};

use uuid::Uuid;

/// Generate a temporary identifier for a pending write.
///
/// The format is `<prefix>_<millis>_<9 alphanumeric chars>`: the time-based
/// component keeps ids roughly monotonic, the random suffix avoids collision
/// between writes created in the same millisecond.
pub(crate) fn temp_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("{}_{}_{}", prefix, millis, suffix)
}
