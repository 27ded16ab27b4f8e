// ── Reactive visit-request collection ──
//
// Concurrent storage with O(1) lookups and push-based change
// notification via `watch` channels. One instance per visit view
// (requester's "mine", recipient's "assigned to me").

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{VisitId, VisitRequest};

/// A reactive collection of visit requests keyed by id.
///
/// Every mutation bumps a version counter and rebuilds the snapshot
/// that subscribers receive; the snapshot is ordered by `scheduled_at`
/// so consumers render a stable list.
pub(crate) struct VisitCollection {
    by_id: DashMap<VisitId, Arc<VisitRequest>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<VisitRequest>>>>,
}

impl VisitCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or update a visit request. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, visit: VisitRequest) -> bool {
        let is_new = !self.by_id.contains_key(&visit.id);
        self.by_id.insert(visit.id.clone(), Arc::new(visit));

        self.rebuild_snapshot();
        self.bump_version();

        is_new
    }

    /// Remove a request by id. Returns the removed request if it existed.
    pub(crate) fn remove(&self, id: &VisitId) -> Option<Arc<VisitRequest>> {
        let removed = self.by_id.remove(id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Look up a request by id.
    pub(crate) fn get(&self, id: &VisitId) -> Option<Arc<VisitRequest>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Replace the collection with an authoritative listing.
    ///
    /// Upsert-then-prune: incoming requests are upserted first, then any
    /// ids not present in the listing are removed. This avoids the brief
    /// empty state that clear-then-insert would broadcast.
    pub(crate) fn apply_listing(&self, listing: Vec<VisitRequest>) {
        let incoming: HashSet<VisitId> = listing.iter().map(|v| v.id.clone()).collect();
        for visit in listing {
            self.by_id.insert(visit.id.clone(), Arc::new(visit));
        }
        let stale: Vec<VisitId> = self
            .by_id
            .iter()
            .map(|r| r.key().clone())
            .filter(|id| !incoming.contains(id))
            .collect();
        for id in stale {
            self.by_id.remove(&id);
        }

        self.rebuild_snapshot();
        self.bump_version();
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<VisitRequest>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<VisitRequest>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into an ordered snapshot vec and broadcast.
    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<VisitRequest>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    /// Increment the version counter.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::VisitStatus;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn visit(id: &str, day: u32) -> VisitRequest {
        let when = NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        VisitRequest {
            id: id.into(),
            property_id: "prop-1".into(),
            requester_id: "buyer-7".into(),
            recipient_id: "agent-3".into(),
            scheduled_at: when,
            note: None,
            status: VisitStatus::Pending,
            created_at: when,
            updated_at: when,
        }
    }

    #[test]
    fn upsert_returns_true_for_new_id() {
        let col = VisitCollection::new();
        assert!(col.upsert(visit("vr-1", 14)));
        assert!(!col.upsert(visit("vr-1", 15)));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn remove_returns_the_request() {
        let col = VisitCollection::new();
        col.upsert(visit("vr-1", 14));

        let removed = col.remove(&"vr-1".into());
        assert_eq!(removed.unwrap().id.as_str(), "vr-1");
        assert!(col.get(&"vr-1".into()).is_none());
        assert!(col.remove(&"vr-1".into()).is_none());
    }

    #[test]
    fn snapshot_is_ordered_by_scheduled_time() {
        let col = VisitCollection::new();
        col.upsert(visit("vr-b", 20));
        col.upsert(visit("vr-a", 14));

        let snap = col.snapshot();
        let ids: Vec<&str> = snap.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["vr-a", "vr-b"]);
    }

    #[test]
    fn apply_listing_prunes_entries_missing_from_the_listing() {
        let col = VisitCollection::new();
        col.upsert(visit("vr-1", 14));
        col.upsert(visit("vr-2", 15));

        // vr-2 was cancelled elsewhere; the authoritative listing only
        // carries vr-1 and a new vr-3.
        col.apply_listing(vec![visit("vr-1", 14), visit("vr-3", 16)]);

        assert_eq!(col.len(), 2);
        assert!(col.get(&"vr-1".into()).is_some());
        assert!(col.get(&"vr-2".into()).is_none());
        assert!(col.get(&"vr-3".into()).is_some());
    }

    #[test]
    fn subscribers_see_mutations() {
        let col = VisitCollection::new();
        let rx = col.subscribe();
        col.upsert(visit("vr-1", 14));
        assert_eq!(rx.borrow().len(), 1);
    }
}
