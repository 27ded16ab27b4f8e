// ── Central reactive scheduling store ──
//
// Local read-mostly caches for the availability calendar and both visit
// views. Mutated only by (a) successful backend responses and (b) the
// expiry sweeper -- no other code path touches these collections, so
// every consumer sees the same state.

mod collection;

use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::watch;

use collection::VisitCollection;

use crate::calendar;
use crate::model::{AvailabilityCalendar, PropertyId, StatusFilter, VisitId, VisitRequest};
use crate::stream::EntityStream;

// ── SyncHealth ──────────────────────────────────────────────────────

/// Health of the polling sync layer, observable by consumers.
///
/// Distinguishes "stale because the backend is unreachable" from
/// "genuinely empty" so views never misreport a failed fetch as no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncHealth {
    /// Last fetch succeeded at the given local time.
    Ok { last_sync: Option<NaiveDateTime> },
    /// Last fetch failed with a retryable error; cached data is stale
    /// but still displayed. Polling continues with backoff.
    Degraded { error: String },
    /// The bearer token was rejected; polling is suspended until a
    /// manual refresh after re-authentication.
    AuthExpired,
}

// ── SchedulingStore ─────────────────────────────────────────────────

/// Central reactive store for the scheduling domain.
///
/// Mutations are broadcast to subscribers via `watch` channels.
pub struct SchedulingStore {
    pub(crate) my_visits: VisitCollection,
    pub(crate) assigned_visits: VisitCollection,
    pub(crate) availability: watch::Sender<Option<Arc<AvailabilityCalendar>>>,
    pub(crate) watched_property: watch::Sender<Option<PropertyId>>,
    pub(crate) sync_health: watch::Sender<SyncHealth>,
}

impl Default for SchedulingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulingStore {
    pub fn new() -> Self {
        let (availability, _) = watch::channel(None);
        let (watched_property, _) = watch::channel(None);
        let (sync_health, _) = watch::channel(SyncHealth::Ok { last_sync: None });

        Self {
            my_visits: VisitCollection::new(),
            assigned_visits: VisitCollection::new(),
            availability,
            watched_property,
            sync_health,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn my_visits_snapshot(&self) -> Arc<Vec<Arc<VisitRequest>>> {
        self.my_visits.snapshot()
    }

    pub fn assigned_visits_snapshot(&self) -> Arc<Vec<Arc<VisitRequest>>> {
        self.assigned_visits.snapshot()
    }

    /// The pruned calendar for the currently watched property, if any
    /// fetch has completed.
    pub fn availability_snapshot(&self) -> Option<Arc<AvailabilityCalendar>> {
        self.availability.borrow().clone()
    }

    pub fn watched_property(&self) -> Option<PropertyId> {
        self.watched_property.borrow().clone()
    }

    // ── Filtered views ───────────────────────────────────────────────

    /// Filter the requester view with a pure predicate over the cache.
    pub fn my_visits_filtered(&self, filter: &StatusFilter) -> Vec<Arc<VisitRequest>> {
        self.my_visits
            .snapshot()
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect()
    }

    /// Filter the recipient view with a pure predicate over the cache.
    pub fn assigned_visits_filtered(&self, filter: &StatusFilter) -> Vec<Arc<VisitRequest>> {
        self.assigned_visits
            .snapshot()
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn my_visit(&self, id: &VisitId) -> Option<Arc<VisitRequest>> {
        self.my_visits.get(id)
    }

    pub fn assigned_visit(&self, id: &VisitId) -> Option<Arc<VisitRequest>> {
        self.assigned_visits.get(id)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn my_visit_count(&self) -> usize {
        self.my_visits.len()
    }

    pub fn assigned_visit_count(&self) -> usize {
        self.assigned_visits.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_my_visits(&self) -> EntityStream<VisitRequest> {
        EntityStream::new(self.my_visits.subscribe())
    }

    pub fn subscribe_assigned_visits(&self) -> EntityStream<VisitRequest> {
        EntityStream::new(self.assigned_visits.subscribe())
    }

    pub fn subscribe_availability(&self) -> watch::Receiver<Option<Arc<AvailabilityCalendar>>> {
        self.availability.subscribe()
    }

    pub fn subscribe_sync_health(&self) -> watch::Receiver<SyncHealth> {
        self.sync_health.subscribe()
    }

    pub fn sync_health(&self) -> SyncHealth {
        self.sync_health.borrow().clone()
    }

    // ── Sweeper entry point ──────────────────────────────────────────

    /// Run one expiry sweep over the cached calendar.
    ///
    /// Purely local -- never deletes anything at the backend. The cache
    /// is only replaced when the sweep actually removed something, so
    /// quiet ticks cause no downstream churn. Returns `true` when the
    /// calendar changed.
    pub fn sweep_availability(&self, now: NaiveDateTime) -> bool {
        let current = self.availability.borrow().clone();
        let Some(calendar) = current else {
            return false;
        };
        match calendar::prune(&calendar, now) {
            Some(pruned) => {
                self.availability.send_replace(Some(Arc::new(pruned)));
                true
            }
            None => false,
        }
    }
}
