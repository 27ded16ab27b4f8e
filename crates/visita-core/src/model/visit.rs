// ── Visit request domain types ──
//
// A visit request is buyer-initiated and moves through two lifecycles:
// approval (pending -> approved | rejected, recipient-driven) and
// outcome (approved -> visited | "not visited", recipient-driven).
// Cancellation removes the request; it is not a status.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ids::{PropertyId, UserId, VisitId};
use crate::error::CoreError;

// ── VisitStatus ─────────────────────────────────────────────────────

/// Lifecycle state of a visit request.
///
/// Wire strings are lowercase, and "not visited" keeps its interior
/// space -- it is matched exactly by the status filter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum VisitStatus {
    #[serde(rename = "pending")]
    #[strum(serialize = "pending")]
    Pending,
    #[serde(rename = "approved")]
    #[strum(serialize = "approved")]
    Approved,
    #[serde(rename = "rejected")]
    #[strum(serialize = "rejected")]
    Rejected,
    #[serde(rename = "visited")]
    #[strum(serialize = "visited")]
    Visited,
    #[serde(rename = "not visited")]
    #[strum(serialize = "not visited")]
    NotVisited,
}

impl VisitStatus {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Visited | Self::NotVisited)
    }

    /// Open requests may still be cancelled by the requester.
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }
}

// ── VisitOutcome ────────────────────────────────────────────────────

/// Outcome recorded by the recipient once the scheduled time has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitOutcome {
    #[serde(rename = "visited")]
    Visited,
    #[serde(rename = "not visited")]
    NotVisited,
}

impl VisitOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visited => "visited",
            Self::NotVisited => "not visited",
        }
    }

    pub fn to_status(self) -> VisitStatus {
        match self {
            Self::Visited => VisitStatus::Visited,
            Self::NotVisited => VisitStatus::NotVisited,
        }
    }
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── StatusFilter ────────────────────────────────────────────────────

/// Listing filter over the already-fetched request set.
///
/// A pure predicate -- not a backend query in the general case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Is(VisitStatus),
}

impl StatusFilter {
    pub fn matches(&self, visit: &VisitRequest) -> bool {
        match self {
            Self::All => true,
            Self::Is(status) => visit.status == *status,
        }
    }

    /// The backend query value, when the caller wants server-side
    /// narrowing instead.
    pub fn as_query(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Is(status) => Some(status.to_string()),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Is(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<VisitStatus>()
            .map(Self::Is)
            .map_err(|_| format!("unknown status filter: {s:?}"))
    }
}

// ── VisitRequest ────────────────────────────────────────────────────

/// A buyer's request to visit a property at a specific date-time.
///
/// `scheduled_at` is deliberately NOT tied to a published `TimeSlot`;
/// slots are advisory and no double-booking prevention happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRequest {
    pub id: VisitId,
    pub property_id: PropertyId,
    pub requester_id: UserId,
    pub recipient_id: UserId,
    pub scheduled_at: NaiveDateTime,
    pub note: Option<String>,
    pub status: VisitStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl VisitRequest {
    /// The requester may move or annotate the request only while pending.
    pub fn ensure_requester_reschedulable(&self) -> Result<(), CoreError> {
        if self.status == VisitStatus::Pending {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.status,
                action: "reschedule",
            })
        }
    }

    /// The recipient may move an approved visit; status is preserved.
    /// Pending requests go through approve/reject first -- this is not
    /// a side door around that decision.
    pub fn ensure_recipient_reschedulable(&self) -> Result<(), CoreError> {
        if self.status == VisitStatus::Approved {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.status,
                action: "reschedule as recipient",
            })
        }
    }

    /// Approve/reject is only decidable from pending.
    pub fn ensure_decidable(&self) -> Result<(), CoreError> {
        if self.status == VisitStatus::Pending {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.status,
                action: "approve or reject",
            })
        }
    }

    /// An outcome is recorded once, from approved only. No elapsed-time
    /// guard here -- the recipient's judgment is trusted.
    pub fn ensure_outcome_recordable(&self) -> Result<(), CoreError> {
        if self.status == VisitStatus::Approved {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.status,
                action: "record an outcome for",
            })
        }
    }

    /// Cancellation removes the request and is allowed from any
    /// non-terminal state.
    pub fn ensure_cancellable(&self) -> Result<(), CoreError> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.status,
                action: "cancel",
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn visit(status: VisitStatus) -> VisitRequest {
        let noon = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        VisitRequest {
            id: "vr-1".into(),
            property_id: "prop-1".into(),
            requester_id: "buyer-7".into(),
            recipient_id: "agent-3".into(),
            scheduled_at: noon,
            note: None,
            status,
            created_at: noon,
            updated_at: noon,
        }
    }

    #[test]
    fn status_round_trips_wire_strings() {
        for (status, wire) in [
            (VisitStatus::Pending, "pending"),
            (VisitStatus::Approved, "approved"),
            (VisitStatus::Rejected, "rejected"),
            (VisitStatus::Visited, "visited"),
            (VisitStatus::NotVisited, "not visited"),
        ] {
            assert_eq!(status.to_string(), wire);
            assert_eq!(wire.parse::<VisitStatus>().unwrap(), status);
        }
    }

    #[test]
    fn terminal_states_are_closed() {
        assert!(VisitStatus::Rejected.is_terminal());
        assert!(VisitStatus::Visited.is_terminal());
        assert!(VisitStatus::NotVisited.is_terminal());
        assert!(VisitStatus::Pending.is_open());
        assert!(VisitStatus::Approved.is_open());
    }

    #[test]
    fn pending_allows_decision_and_requester_reschedule_only() {
        let v = visit(VisitStatus::Pending);
        assert!(v.ensure_decidable().is_ok());
        assert!(v.ensure_requester_reschedulable().is_ok());
        assert!(v.ensure_cancellable().is_ok());
        // Recipient reschedule must not bypass approve/reject.
        assert!(matches!(
            v.ensure_recipient_reschedulable(),
            Err(CoreError::InvalidTransition { .. })
        ));
        assert!(v.ensure_outcome_recordable().is_err());
    }

    #[test]
    fn approved_allows_outcome_and_recipient_reschedule_only() {
        let v = visit(VisitStatus::Approved);
        assert!(v.ensure_outcome_recordable().is_ok());
        assert!(v.ensure_recipient_reschedulable().is_ok());
        assert!(v.ensure_cancellable().is_ok());
        assert!(v.ensure_decidable().is_err());
        assert!(v.ensure_requester_reschedulable().is_err());
    }

    #[test]
    fn terminal_states_refuse_everything() {
        for status in [
            VisitStatus::Rejected,
            VisitStatus::Visited,
            VisitStatus::NotVisited,
        ] {
            let v = visit(status);
            assert!(v.ensure_decidable().is_err());
            assert!(v.ensure_requester_reschedulable().is_err());
            assert!(v.ensure_recipient_reschedulable().is_err());
            assert!(v.ensure_outcome_recordable().is_err());
            assert!(v.ensure_cancellable().is_err(), "{status} must not cancel");
        }
    }

    #[test]
    fn filter_matches_exact_status() {
        let pending = visit(VisitStatus::Pending);
        let visited = visit(VisitStatus::Visited);

        assert!(StatusFilter::All.matches(&pending));
        assert!(StatusFilter::Is(VisitStatus::Pending).matches(&pending));
        assert!(!StatusFilter::Is(VisitStatus::Pending).matches(&visited));
    }

    #[test]
    fn filter_parses_not_visited_with_space() {
        let filter: StatusFilter = "not visited".parse().unwrap();
        assert_eq!(filter, StatusFilter::Is(VisitStatus::NotVisited));
        assert_eq!(filter.as_query().as_deref(), Some("not visited"));
        assert!("no such".parse::<StatusFilter>().is_err());
    }
}
