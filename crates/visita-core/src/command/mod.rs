// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// portal validates each variant client-side (lead time, future time,
// state-machine guards against the cached request) before the backend
// round-trip; the backend response is authoritative.

pub mod requests;

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::CoreError;
use crate::model::{SlotId, TimeSlot, VisitId, VisitOutcome, VisitRequest};

pub use requests::{CreateVisitRequest, PublishSlotsRequest, RescheduleRequest};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All possible write operations against the scheduling backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Availability (agent/admin) ───────────────────────────────────
    PublishSlots(PublishSlotsRequest),
    /// Idempotent: deleting an id the backend no longer knows is not an
    /// error for the caller.
    DeleteSlot {
        id: SlotId,
    },

    // ── Visit requests (requester) ───────────────────────────────────
    CreateVisit(CreateVisitRequest),
    RescheduleVisit {
        id: VisitId,
        update: RescheduleRequest,
    },
    /// Cancellation removes the request entirely; it is not a status.
    CancelVisit {
        id: VisitId,
    },

    // ── Visit requests (recipient) ───────────────────────────────────
    ApproveVisit {
        id: VisitId,
    },
    RejectVisit {
        id: VisitId,
    },
    /// Move an approved visit without resetting its status.
    RecipientReschedule {
        id: VisitId,
        scheduled_at: NaiveDateTime,
    },
    RecordOutcome {
        id: VisitId,
        outcome: VisitOutcome,
    },
}

/// Result payload of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    /// The authoritative request state returned by the backend.
    Visit(Arc<VisitRequest>),
    /// The slots the backend actually created.
    Slots(Vec<TimeSlot>),
}
