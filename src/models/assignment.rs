//! Temporary Assignments
//!
//! An admin can cover an absence by assigning a delivery agent to a store
//! for a single date.

use serde::{Deserialize, Serialize};

/// A one-day store assignment for a delivery agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryAssignment {
    /// Server-assigned identifier
    pub id: i64,
    /// Covered store
    pub store_id: i64,
    /// Covering delivery agent
    pub repartidor_id: i64,
    /// Date of the assignment, `YYYY-MM-DD`
    pub date: String,
}
