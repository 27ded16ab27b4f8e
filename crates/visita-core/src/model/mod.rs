// ── Domain model ──
//
// Canonical scheduling types shared by the store, the portal, and
// consumers. Wire conversions live in `crate::convert`.

pub mod ids;
pub mod slot;
pub mod visit;

pub use ids::{PropertyId, SlotId, UserId, VisitId};
pub use slot::{AvailabilityCalendar, ParseSlotTimeError, SlotTime, TimeSlot};
pub use visit::{StatusFilter, VisitOutcome, VisitRequest, VisitStatus};
