//! Store Visits
//!
//! A visit is registered by scanning a store code; the create operation is
//! query-string based (`POST /visits/scan`). As with orders, the wire type
//! and the queued type are kept separate so replay cannot leak local-only
//! fields.

use serde::{Deserialize, Serialize};

use super::temp_id;

/// Parameters of `POST /visits/scan`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitScan {
    /// Scanned store code
    pub store_code: String,
    /// Delivery agent registering the visit
    pub repartidor_id: i64,
    /// Latitude at scan time
    pub lat: f64,
    /// Longitude at scan time
    pub lng: f64,
    /// Whether the visit produced an order
    #[serde(default)]
    pub had_order: bool,
    /// Whether the agent covers this store temporarily
    #[serde(default)]
    pub temporary: bool,
}

/// A visit acknowledged by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    /// Server-assigned identifier
    pub id: i64,
    /// Visited store
    pub store_id: i64,
    /// Delivery agent who visited
    pub repartidor_id: i64,
    /// Server-side visit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited_at: Option<String>,
    /// Whether the visit produced an order
    #[serde(default)]
    pub had_order: bool,
}

/// A visit scanned while offline, waiting for acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingVisit {
    /// Locally-generated temporary identifier
    pub temp_id: String,
    /// The scan the replay will submit
    #[serde(flatten)]
    pub scan: VisitScan,
    /// Always true for queued writes
    pub offline: bool,
    /// Creation time, milliseconds since the epoch
    pub timestamp: i64,
}

impl PendingVisit {
    /// Queue a new visit scan, stamping the local-only fields
    pub fn new(scan: VisitScan) -> Self {
        Self {
            temp_id: temp_id("offline_visit"),
            scan,
            offline: true,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Strip the local-only fields down to the wire payload
    pub fn wire_payload(&self) -> VisitScan {
        self.scan.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scan() -> VisitScan {
        VisitScan {
            store_code: "TC-07".to_string(),
            repartidor_id: 4,
            lat: 19.4326,
            lng: -99.1332,
            had_order: true,
            temporary: false,
        }
    }

    #[test]
    fn test_pending_visit_id_prefix() {
        let pending = PendingVisit::new(sample_scan());
        assert!(pending.temp_id.starts_with("offline_visit_"));
        assert!(pending.offline);
    }

    #[test]
    fn test_scan_flags_default_to_false() {
        let scan: VisitScan = serde_json::from_str(
            r#"{"storeCode":"TC-07","repartidorId":4,"lat":1.0,"lng":2.0}"#,
        )
        .unwrap();
        assert!(!scan.had_order);
        assert!(!scan.temporary);
    }
}
