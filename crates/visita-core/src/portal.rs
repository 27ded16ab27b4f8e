// ── Portal abstraction ──
//
// Full lifecycle management for a scheduling session against the
// marketplace backend. Handles the initial sync, background polling,
// the local expiry sweeper, command routing, and reactive data
// streaming through the SchedulingStore.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::{Mutex, Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use visita_api::types::{
    CreateVisitBody, PublishSlotsBody, RecipientRescheduleBody, RescheduleBody,
};
use visita_api::{SchedulingClient, TransportConfig};

use crate::calendar;
use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::PortalConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{
    AvailabilityCalendar, PropertyId, SlotTime, VisitId, VisitRequest, VisitStatus,
};
use crate::store::{SchedulingStore, SyncHealth};
use crate::stream::EntityStream;

const COMMAND_CHANNEL_SIZE: usize = 32;

/// Ceiling for the poll backoff when the backend keeps failing.
const POLL_BACKOFF_MAX: Duration = Duration::from_secs(300);

/// The viewer's local wall-clock time. All scheduling decisions use
/// this clock; timezone conversion is out of scope.
fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Portal ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<PortalInner>`. Manages the session
/// lifecycle: initial sync, background polling and sweeping, command
/// routing, and reactive entity streaming.
#[derive(Clone)]
pub struct Portal {
    inner: Arc<PortalInner>,
}

struct PortalInner {
    config: PortalConfig,
    store: Arc<SchedulingStore>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current session -- cancelled on disconnect,
    /// replaced on reconnect (avoids permanent cancellation).
    cancel_child: Mutex<CancellationToken>,
    client: Mutex<Option<SchedulingClient>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Wakes the visit poll task for an immediate authoritative fetch;
    /// also resumes polling suspended by an auth failure.
    poll_now: Notify,
    /// Fetch generations -- a response is applied only while it is still
    /// the most recently initiated fetch of its kind.
    availability_gen: AtomicU64,
    visits_gen: AtomicU64,
}

impl Portal {
    /// Create a new Portal from configuration. Does NOT talk to the
    /// backend -- call [`connect()`](Self::connect) to sync and start
    /// background tasks.
    pub fn new(config: PortalConfig) -> Self {
        let store = Arc::new(SchedulingStore::new());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(PortalInner {
                config,
                store,
                connection_state,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                client: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
                poll_now: Notify::new(),
                availability_gen: AtomicU64::new(0),
                visits_gen: AtomicU64::new(0),
            }),
        }
    }

    /// Access the portal configuration.
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Access the underlying SchedulingStore.
    pub fn store(&self) -> &Arc<SchedulingStore> {
        &self.inner.store
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Connect to the backend.
    ///
    /// Builds the HTTP client, performs the initial visit sync, and
    /// spawns background tasks (expiry sweeper, visit polling, command
    /// processor).
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        // Fresh child token for this session (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let config = &self.inner.config;
        let transport = TransportConfig {
            timeout: Some(config.timeout),
            bearer_token: config.token.clone(),
        };
        let client = match SchedulingClient::new(config.url.as_str(), &transport) {
            Ok(c) => c,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        *self.inner.client.lock().await = Some(client);

        // Initial authoritative fetch of both visit views.
        if let Err(e) = self.sync_visits().await {
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            *self.inner.client.lock().await = None;
            return Err(e);
        }

        // Spawn background tasks
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let portal = self.clone();
            handles.push(tokio::spawn(command_processor_task(portal, rx)));
        }

        let sweep_interval = config.sweep_interval;
        if !sweep_interval.is_zero() {
            let portal = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(sweeper_task(portal, sweep_interval, cancel)));
        }

        let poll_interval = config.visit_poll_interval;
        if !poll_interval.is_zero() {
            let portal = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(visit_poll_task(portal, poll_interval, cancel)));
        }

        drop(handles);

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!("connected to scheduling backend");
        Ok(())
    }

    /// Disconnect from the backend.
    ///
    /// Cancels background tasks and resets the connection state to
    /// [`Disconnected`](ConnectionState::Disconnected).
    pub async fn disconnect(&self) {
        // Cancel the child token (not the parent -- allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        // Join all background tasks
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        *self.inner.client.lock().await = None;

        // Recreate the command channel so reconnects can spawn a fresh
        // receiver. The previous receiver is consumed by the command
        // processor task.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Availability view ────────────────────────────────────────

    /// Start watching a property's availability: sets the watched
    /// property and fetches its calendar. Switching properties clears
    /// the previous calendar immediately so a stale one never shows
    /// under the new property id.
    pub async fn watch_property(
        &self,
        property_id: PropertyId,
    ) -> Result<Arc<AvailabilityCalendar>, CoreError> {
        let switching = self.inner.store.watched_property().as_ref() != Some(&property_id);
        self.inner
            .store
            .watched_property
            .send_replace(Some(property_id));
        if switching {
            self.inner.store.availability.send_replace(None);
        }
        self.refresh_availability().await
    }

    /// Force a fresh availability fetch for the watched property.
    ///
    /// The response is pruned against the local clock before it is
    /// applied. A failed fetch leaves the last-known-good calendar in
    /// place; a response that lost the race to a newer fetch is
    /// discarded rather than flickering the view backwards.
    pub async fn refresh_availability(&self) -> Result<Arc<AvailabilityCalendar>, CoreError> {
        let Some(property_id) = self.inner.store.watched_property() else {
            return Err(CoreError::Internal(
                "refresh_availability called with no watched property".into(),
            ));
        };
        let client = self.require_client().await?;

        let generation = self.inner.availability_gen.fetch_add(1, Ordering::SeqCst) + 1;
        let raw = client.get_availability(property_id.as_str()).await?;

        let slots = convert::slots_from_wire(raw);
        let calendar = Arc::new(calendar::build_calendar(
            property_id.clone(),
            slots,
            local_now(),
        ));

        let still_current = self.inner.availability_gen.load(Ordering::SeqCst) == generation
            && self.inner.store.watched_property().as_ref() == Some(&property_id);
        if still_current {
            self.inner
                .store
                .availability
                .send_replace(Some(Arc::clone(&calendar)));
        } else {
            debug!(property = %property_id, "discarding stale availability response");
        }

        Ok(calendar)
    }

    /// Suggest the next publishable half-hour window for `date`,
    /// against the local clock. Pure helper -- no backend round-trip.
    pub fn suggest_next_window(&self, date: NaiveDate) -> Option<(SlotTime, SlotTime)> {
        calendar::suggest_next_window(date, local_now())
    }

    // ── Visit views ──────────────────────────────────────────────

    /// Fetch both visit views and apply them to the store.
    ///
    /// On failure the cached views are preserved and the sync health is
    /// downgraded; the error is returned for the caller to surface.
    pub async fn sync_visits(&self) -> Result<(), CoreError> {
        let client = self.require_client().await?;

        let generation = self.inner.visits_gen.fetch_add(1, Ordering::SeqCst) + 1;
        let (mine_res, assigned_res) =
            tokio::join!(client.list_my_visits(None), client.list_assigned_visits(None));

        if self.inner.visits_gen.load(Ordering::SeqCst) != generation {
            debug!("discarding stale visit listings");
            return Ok(());
        }

        match (mine_res, assigned_res) {
            (Ok(mine), Ok(assigned)) => {
                self.inner
                    .store
                    .my_visits
                    .apply_listing(convert::visits_from_wire(mine));
                self.inner
                    .store
                    .assigned_visits
                    .apply_listing(convert::visits_from_wire(assigned));
                self.inner.store.sync_health.send_replace(SyncHealth::Ok {
                    last_sync: Some(local_now()),
                });
                debug!(
                    mine = self.inner.store.my_visit_count(),
                    assigned = self.inner.store.assigned_visit_count(),
                    "visit sync complete"
                );
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                let err = CoreError::from(e);
                let health = if err.is_auth_expired() {
                    SyncHealth::AuthExpired
                } else {
                    SyncHealth::Degraded {
                        error: err.to_string(),
                    }
                };
                self.inner.store.sync_health.send_replace(health);
                Err(err)
            }
        }
    }

    /// Wake the poll task for an immediate authoritative re-fetch.
    /// Also resumes polling that was suspended by an auth failure.
    pub fn refresh_now(&self) {
        self.inner.poll_now.notify_waiters();
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command against the backend.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::PortalDisconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::PortalDisconnected)?;

        rx.await.map_err(|_| CoreError::PortalDisconnected)?
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Optimized for CLI: disables polling and sweeping since we only
    /// need a single request-response cycle.
    pub async fn oneshot<F, Fut, T>(config: PortalConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Portal) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.visit_poll_interval = Duration::ZERO;
        cfg.sweep_interval = Duration::ZERO;

        let portal = Portal::new(cfg);
        portal.connect().await?;
        let result = f(portal.clone()).await;
        portal.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to sync health changes.
    pub fn sync_health(&self) -> watch::Receiver<SyncHealth> {
        self.inner.store.subscribe_sync_health()
    }

    // ── Snapshot accessors (delegate to SchedulingStore) ─────────

    pub fn my_visits_snapshot(&self) -> Arc<Vec<Arc<VisitRequest>>> {
        self.inner.store.my_visits_snapshot()
    }

    pub fn assigned_visits_snapshot(&self) -> Arc<Vec<Arc<VisitRequest>>> {
        self.inner.store.assigned_visits_snapshot()
    }

    pub fn availability_snapshot(&self) -> Option<Arc<AvailabilityCalendar>> {
        self.inner.store.availability_snapshot()
    }

    // ── Stream accessors (delegate to SchedulingStore) ───────────

    pub fn my_visits(&self) -> EntityStream<VisitRequest> {
        self.inner.store.subscribe_my_visits()
    }

    pub fn assigned_visits(&self) -> EntityStream<VisitRequest> {
        self.inner.store.subscribe_assigned_visits()
    }

    pub fn availability(&self) -> watch::Receiver<Option<Arc<AvailabilityCalendar>>> {
        self.inner.store.subscribe_availability()
    }

    // ── Private helpers ──────────────────────────────────────────

    async fn require_client(&self) -> Result<SchedulingClient, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::PortalDisconnected)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodic local expiry sweep over the cached calendar.
///
/// Pure local computation -- never suspends on the network and never
/// deletes anything at the backend.
async fn sweeper_task(portal: Portal, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if portal.inner.store.sweep_availability(local_now()) {
                    debug!("expiry sweep pruned the cached calendar");
                }
            }
        }
    }
}

/// Periodic authoritative re-fetch of both visit views.
///
/// Transient failures back off exponentially (capped); an auth failure
/// suspends polling entirely until `refresh_now()` signals that the
/// user re-authenticated. Failed fetches never clear displayed data --
/// `sync_visits` only downgrades the health signal.
async fn visit_poll_task(portal: Portal, period: Duration, cancel: CancellationToken) {
    let mut delay = period;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = portal.inner.poll_now.notified() => {},
            () = tokio::time::sleep(delay) => {}
        }

        match portal.sync_visits().await {
            Ok(()) => {
                delay = period;
            }
            Err(e) if e.is_auth_expired() => {
                warn!(error = %e, "visit poll suspended until re-authentication");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = portal.inner.poll_now.notified() => {
                        delay = period;
                    }
                }
            }
            Err(e) => {
                delay = (delay * 2).min(POLL_BACKOFF_MAX);
                debug!(error = %e, next_poll_secs = delay.as_secs(), "visit poll failed, backing off");
            }
        }
    }
}

async fn command_processor_task(portal: Portal, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = portal.inner.cancel_child.lock().await.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&portal, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

/// Route a command to the appropriate backend call.
///
/// Validation that can be resolved client-side (lead time, future time,
/// state-machine guards against the cached request) happens before any
/// network call. The backend response is authoritative over local
/// state, and mutating visit operations trigger an immediate re-poll.
#[allow(clippy::too_many_lines)]
async fn route_command(portal: &Portal, cmd: Command) -> Result<CommandResult, CoreError> {
    let store = &portal.inner.store;
    let client = portal.require_client().await?;

    match cmd {
        // ── Availability operations ──────────────────────────────
        Command::PublishSlots(req) => {
            // Malformed entries are dropped silently; the remaining
            // candidates are validated all-or-nothing.
            let times = calendar::parse_times(&req.times);
            if times.is_empty() {
                return Err(CoreError::ValidationFailed {
                    message: "no valid HH:MM slot times to publish".into(),
                });
            }
            calendar::validate_slot_times(req.date, &times, local_now())?;

            let body = PublishSlotsBody {
                date: req.date,
                times: times.iter().map(ToString::to_string).collect(),
            };
            let created = client.publish_slots(req.property_id.as_str(), &body).await?;
            let slots: Vec<_> = created
                .into_iter()
                .filter_map(convert::slot_from_wire)
                .collect();

            refresh_if_watching(portal, &req.property_id).await;
            Ok(CommandResult::Slots(slots))
        }

        Command::DeleteSlot { id } => {
            match client.delete_slot(id.as_str()).await {
                Ok(()) => {}
                // Idempotent: an id the backend no longer knows is fine.
                Err(e) if e.is_not_found() => {
                    debug!(slot = %id, "delete of unknown slot treated as success");
                }
                Err(e) => return Err(e.into()),
            }

            if let Some(property_id) = store.watched_property() {
                refresh_if_watching(portal, &property_id).await;
            }
            Ok(CommandResult::Ok)
        }

        // ── Requester operations ─────────────────────────────────
        Command::CreateVisit(req) => {
            calendar::validate_schedule_time(req.scheduled_at, local_now())?;

            let body = CreateVisitBody {
                property_id: req.property_id.into_string(),
                scheduled_at: req.scheduled_at,
                note: req.note,
            };
            let created = client.create_visit(&body).await?;
            let visit = require_visit(created)?;
            store.my_visits.upsert(visit.clone());
            Ok(CommandResult::Visit(Arc::new(visit)))
        }

        Command::RescheduleVisit { id, update } => {
            calendar::validate_schedule_time(update.scheduled_at, local_now())?;
            let existing = store.my_visit(&id).ok_or_else(|| CoreError::NotFound {
                entity: "visit request",
                identifier: id.to_string(),
            })?;
            existing.ensure_requester_reschedulable()?;

            let body = RescheduleBody {
                scheduled_at: update.scheduled_at,
                note: update.note,
            };
            let result = client.reschedule_visit(id.as_str(), &body).await;
            let updated = apply_visit_mutation(portal, result, |v| {
                store.my_visits.upsert(v);
            })?;
            Ok(CommandResult::Visit(updated))
        }

        Command::CancelVisit { id } => {
            let existing = store.my_visit(&id).ok_or_else(|| CoreError::NotFound {
                entity: "visit request",
                identifier: id.to_string(),
            })?;
            // Cancelling a terminal request is refused, not silently
            // swallowed -- the view re-fetches and shows the outcome.
            existing.ensure_cancellable()?;

            match client.delete_visit(id.as_str()).await {
                Ok(()) => {}
                Err(e) => {
                    let err = CoreError::from(e);
                    if matches!(err, CoreError::Conflict { .. }) {
                        portal.refresh_now();
                    }
                    return Err(err);
                }
            }
            store.my_visits.remove(&id);
            portal.refresh_now();
            Ok(CommandResult::Ok)
        }

        // ── Recipient operations ─────────────────────────────────
        Command::ApproveVisit { id } => {
            decide_visit(portal, &client, &id, VisitStatus::Approved).await
        }

        Command::RejectVisit { id } => {
            decide_visit(portal, &client, &id, VisitStatus::Rejected).await
        }

        Command::RecipientReschedule { id, scheduled_at } => {
            calendar::validate_schedule_time(scheduled_at, local_now())?;
            let existing = store.assigned_visit(&id).ok_or_else(|| CoreError::NotFound {
                entity: "assigned visit request",
                identifier: id.to_string(),
            })?;
            // Only meaningful on approved requests; never a bypass of
            // the approve/reject decision.
            existing.ensure_recipient_reschedulable()?;

            let body = RecipientRescheduleBody { scheduled_at };
            let result = client.recipient_reschedule(id.as_str(), &body).await;
            let updated = apply_visit_mutation(portal, result, |v| {
                store.assigned_visits.upsert(v);
            })?;
            Ok(CommandResult::Visit(updated))
        }

        Command::RecordOutcome { id, outcome } => {
            let existing = store.assigned_visit(&id).ok_or_else(|| CoreError::NotFound {
                entity: "assigned visit request",
                identifier: id.to_string(),
            })?;
            existing.ensure_outcome_recordable()?;

            let result = client.record_outcome(id.as_str(), outcome.as_str()).await;
            let updated = apply_visit_mutation(portal, result, |v| {
                store.assigned_visits.upsert(v);
            })?;
            Ok(CommandResult::Visit(updated))
        }
    }
}

/// Shared approve/reject path.
async fn decide_visit(
    portal: &Portal,
    client: &SchedulingClient,
    id: &VisitId,
    decision: VisitStatus,
) -> Result<CommandResult, CoreError> {
    let store = &portal.inner.store;
    let existing = store.assigned_visit(id).ok_or_else(|| CoreError::NotFound {
        entity: "assigned visit request",
        identifier: id.to_string(),
    })?;
    existing.ensure_decidable()?;

    let result = client.set_status(id.as_str(), &decision.to_string()).await;
    let updated = apply_visit_mutation(portal, result, |v| {
        store.assigned_visits.upsert(v);
    })?;
    Ok(CommandResult::Visit(updated))
}

/// Apply the authoritative response of a visit mutation to the store
/// and schedule a re-poll. A conflict also forces a re-poll so the
/// actor sees what the item became before acting again.
fn apply_visit_mutation(
    portal: &Portal,
    result: Result<visita_api::types::VisitRequestResponse, visita_api::Error>,
    apply: impl FnOnce(VisitRequest),
) -> Result<Arc<VisitRequest>, CoreError> {
    match result {
        Ok(raw) => {
            let visit = require_visit(raw)?;
            apply(visit.clone());
            portal.refresh_now();
            Ok(Arc::new(visit))
        }
        Err(e) => {
            let err = CoreError::from(e);
            if matches!(err, CoreError::Conflict { .. }) {
                portal.refresh_now();
            }
            Err(err)
        }
    }
}

/// A mutation response we cannot parse means we cannot trust local
/// state -- surface it instead of guessing.
fn require_visit(
    raw: visita_api::types::VisitRequestResponse,
) -> Result<VisitRequest, CoreError> {
    convert::visit_from_wire(raw).ok_or_else(|| {
        CoreError::Internal("backend returned a visit request with an unknown status".into())
    })
}

/// Re-fetch availability after a slot mutation when the mutated
/// property is the one on screen. Non-fatal -- the mutation itself
/// already succeeded.
async fn refresh_if_watching(portal: &Portal, property_id: &PropertyId) {
    if portal.inner.store.watched_property().as_ref() == Some(property_id) {
        if let Err(e) = portal.refresh_availability().await {
            warn!(error = %e, "availability refresh after mutation failed");
        }
    }
}
