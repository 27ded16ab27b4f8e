// ── Wire-to-domain conversions ──
//
// The backend is lenient about what it stores; we are strict about what
// we keep. Entries that fail to parse are dropped with a warning rather
// than poisoning the whole response.

use tracing::warn;

use visita_api::types::{AvailabilityResponse, SlotResponse, VisitRequestResponse};

use crate::model::{SlotTime, TimeSlot, VisitRequest, VisitStatus};

/// Convert one wire slot; `None` if either time is not `HH:MM`.
pub(crate) fn slot_from_wire(raw: SlotResponse) -> Option<TimeSlot> {
    let start: SlotTime = match raw.start_time.parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(slot = %raw.id, start = %raw.start_time, "dropping slot with malformed start time");
            return None;
        }
    };
    // A malformed end is repaired from the start; end is advisory.
    let end: SlotTime = raw
        .end_time
        .parse()
        .ok()
        .or_else(|| start.plus_minutes(crate::calendar::SLOT_DURATION_MIN))
        .unwrap_or(start);

    Some(TimeSlot {
        id: raw.id.into(),
        property_id: raw.property_id.into(),
        date: raw.date,
        start,
        end,
    })
}

/// Convert an availability response into a raw slot list.
pub(crate) fn slots_from_wire(raw: AvailabilityResponse) -> Vec<TimeSlot> {
    raw.slots.into_iter().filter_map(slot_from_wire).collect()
}

/// Convert one wire visit request; `None` on an unknown status string.
pub(crate) fn visit_from_wire(raw: VisitRequestResponse) -> Option<VisitRequest> {
    let status: VisitStatus = match raw.status.parse() {
        Ok(s) => s,
        Err(_) => {
            warn!(visit = %raw.id, status = %raw.status, "dropping visit request with unknown status");
            return None;
        }
    };

    Some(VisitRequest {
        id: raw.id.into(),
        property_id: raw.property_id.into(),
        requester_id: raw.requester_id.into(),
        recipient_id: raw.recipient_id.into(),
        scheduled_at: raw.scheduled_at,
        note: raw.note,
        status,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

/// Convert a listing, dropping unparseable entries.
pub(crate) fn visits_from_wire(raw: Vec<VisitRequestResponse>) -> Vec<VisitRequest> {
    raw.into_iter().filter_map(visit_from_wire).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wire_slot(start: &str, end: &str) -> SlotResponse {
        SlotResponse {
            id: "slot-a".into(),
            property_id: "prop-1".into(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            start_time: start.into(),
            end_time: end.into(),
        }
    }

    #[test]
    fn malformed_start_drops_the_slot() {
        assert!(slot_from_wire(wire_slot("25:00", "10:30")).is_none());
        assert!(slot_from_wire(wire_slot("10:00", "10:30")).is_some());
    }

    #[test]
    fn malformed_end_is_repaired_from_start() {
        let slot = slot_from_wire(wire_slot("10:00", "oops")).unwrap();
        assert_eq!(slot.end.to_string(), "10:30");
    }

    #[test]
    fn unknown_status_drops_the_visit() {
        let raw = VisitRequestResponse {
            id: "vr-1".into(),
            property_id: "prop-1".into(),
            requester_id: "buyer-7".into(),
            recipient_id: "agent-3".into(),
            scheduled_at: "2026-03-14T15:30:00".parse().unwrap(),
            note: None,
            status: "archived".into(),
            created_at: "2026-03-01T09:00:00".parse().unwrap(),
            updated_at: "2026-03-01T09:00:00".parse().unwrap(),
        };
        assert!(visit_from_wire(raw).is_none());
    }
}
