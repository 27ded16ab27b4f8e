// ── Typed request structs for Command payloads ──

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::PropertyId;

/// Batch-publish slots for one date.
///
/// `times` carries the raw `HH:MM` strings from the form; malformed
/// entries are silently dropped before the lead-time check runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSlotsRequest {
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub times: Vec<String>,
}

/// Create a visit request for a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVisitRequest {
    pub property_id: PropertyId,
    pub scheduled_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Requester reschedule of a pending request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub scheduled_at: NaiveDateTime,
    /// `None` leaves the existing note untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
