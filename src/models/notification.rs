//! Notifications
//!
//! `ServerNotification` is the record returned by `GET /notifications`.
//! `PushPayload` is the body of a platform push event; it may carry a
//! structured `notification` object, a raw `data` map, both, or neither,
//! and the display extraction defaults each missing part.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default title shown when a push carries none
pub const DEFAULT_PUSH_TITLE: &str = "Nueva notificación";

/// Default body shown when a push carries none
pub const DEFAULT_PUSH_BODY: &str = "Tienes una nueva notificación";

/// A notification record from the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerNotification {
    /// Server-assigned identifier
    pub id: i64,
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Creation time as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Structured notification part of a push payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PushNotificationPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Body of a platform push event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PushPayload {
    /// Structured notification payload, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<PushNotificationPart>,
    /// Raw data payload, when present
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
}

/// A notification ready to be shown by the host platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNotification {
    pub title: String,
    pub body: String,
    /// Grouping tag, from the data payload's `tipo` when present
    pub tag: String,
}

impl PushPayload {
    /// Extract title and body, preferring the structured notification part,
    /// then the raw data map, then the defaults.
    pub fn display(&self) -> DisplayNotification {
        let title = self
            .notification
            .as_ref()
            .and_then(|n| n.title.clone())
            .or_else(|| self.data.get("title").cloned())
            .unwrap_or_else(|| DEFAULT_PUSH_TITLE.to_string());
        let body = self
            .notification
            .as_ref()
            .and_then(|n| n.body.clone())
            .or_else(|| self.data.get("body").cloned())
            .unwrap_or_else(|| DEFAULT_PUSH_BODY.to_string());
        let tag = self
            .data
            .get("tipo")
            .cloned()
            .unwrap_or_else(|| "general".to_string());
        DisplayNotification { title, body, tag }
    }
}
