//! Scheduling domain and reactive data layer between `visita-api` and UI
//! consumers (CLI today, web views tomorrow).
//!
//! This crate owns the correctness logic of property-visit scheduling for
//! the Visita marketplace:
//!
//! - **[`Portal`]** -- Central facade managing the full lifecycle:
//!   [`connect()`](Portal::connect) performs an initial visit sync, then
//!   spawns background tasks for the expiry sweeper, periodic visit
//!   polling, and command processing. [`Portal::oneshot()`] provides a
//!   lightweight fire-and-forget mode for single CLI invocations.
//!
//! - **[`SchedulingStore`]** -- Reactive storage (`DashMap` +
//!   `tokio::sync::watch` channels) for the two visit-request views and
//!   the pruned availability calendar. Mutated only by successful backend
//!   responses and the expiry sweeper.
//!
//! - **[`calendar`]** -- Pure functions over `(slots, now)`: lead-time
//!   validation, calendar construction, expiry pruning, and the
//!   next-free-window suggestion. No networking, unit-testable with a
//!   fixed clock.
//!
//! - **[`Command`]** -- Typed mutation requests routed through an `mpsc`
//!   channel to the portal's command processor. Every mutation is
//!   validated client-side first, then confirmed by the backend -- the
//!   backend response is authoritative.
//!
//! - **Domain model** ([`model`]) -- `TimeSlot`, `AvailabilityCalendar`,
//!   and `VisitRequest` with its approval/outcome state machine.

pub mod calendar;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod portal;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::PortalConfig;
pub use error::CoreError;
pub use portal::{ConnectionState, Portal};
pub use store::{SchedulingStore, SyncHealth};
pub use stream::EntityStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AvailabilityCalendar, PropertyId, SlotId, SlotTime, StatusFilter, TimeSlot, UserId, VisitId,
    VisitOutcome, VisitRequest, VisitStatus,
};
