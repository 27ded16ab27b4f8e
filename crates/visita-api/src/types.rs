//! Wire types for the Visita scheduling endpoints.
//!
//! All types match the JSON exchanged with `/api/v1/` endpoints.
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! Slot times-of-day cross the wire as `HH:MM` 24-hour strings paired
//! with a separate calendar date; absolute timestamps cross as
//! `YYYY-MM-DDTHH:MM:SS` local date-times.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ── Availability ─────────────────────────────────────────────────────

/// A published visit slot -- element of `GET .../availability` and
/// `POST .../slots` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: String,
    pub property_id: String,
    pub date: NaiveDate,
    /// `HH:MM`, 24-hour.
    pub start_time: String,
    /// `HH:MM`, 24-hour. Advisory -- in practice `startTime + 30min`.
    pub end_time: String,
}

/// Full availability for one property -- from `GET /v1/properties/{id}/availability`.
///
/// The raw slot list as the backend knows it. The caller is responsible
/// for pruning past entries against its own clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub property_id: String,
    #[serde(default)]
    pub slots: Vec<SlotResponse>,
}

/// Body of `POST /v1/properties/{id}/slots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSlotsBody {
    pub date: NaiveDate,
    /// `HH:MM` start times; one slot is created per entry.
    pub times: Vec<String>,
}

// ── Visit requests ───────────────────────────────────────────────────

/// A visit request -- returned by every visit-request endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequestResponse {
    pub id: String,
    pub property_id: String,
    pub requester_id: String,
    pub recipient_id: String,
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub note: Option<String>,
    /// One of: `pending`, `approved`, `rejected`, `visited`, `not visited`.
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Body of `POST /v1/visit-requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitBody {
    pub property_id: String,
    pub scheduled_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body of `PUT /v1/visit-requests/{id}/schedule` (requester reschedule).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleBody {
    pub scheduled_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body of `PUT /v1/visit-requests/{id}/recipient-schedule`.
///
/// The recipient may move an approved visit but never edits the note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientRescheduleBody {
    pub scheduled_at: NaiveDateTime,
}

/// Body of `PUT /v1/visit-requests/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBody {
    /// `approved` or `rejected`.
    pub status: String,
}

/// Body of `PUT /v1/visit-requests/{id}/outcome`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeBody {
    /// `visited` or `not visited`.
    pub outcome: String,
}
