//! # Document list synchronization
//!
//! [`DocumentSyncController`] owns the displayed page of documents. It turns
//! bursts of load requests into single network calls and guarantees that only
//! the most recently issued fetch can ever write state.
//!
//! ## Request lifecycle
//!
//! ```text
//! request_load ──debounce──> begin_fetch ──spawn──> api.list (timeout, token)
//!                                 │                        │
//!                  skip if in flight (unless forced)       ▼
//!                                                   finish_fetch(generation)
//!                                                  ┌───────┴────────┐
//!                                            stale: drop       current:
//!                                                          empty → commit now
//!                                                          data  → settle → commit
//!                                                          error → keep display
//! ```
//!
//! Every fetch gets a generation number and a `CancellationToken`. Superseding
//! a fetch cancels its token and bumps the generation under the state lock, so
//! a late result is discarded even if it raced the cancellation.
//!
//! Spawned tasks only hold a `Weak` handle to the controller; once the
//! controller is disposed or dropped they have nothing left to write to.

use bridge_traits::notification::{Notification, Notifier};
use core_async::sync::{watch, CancellationToken};
use core_async::time::timeout;
use core_async::TimerSlot;
use core_runtime::config::SyncSettings;
use core_runtime::events::{CoreEvent, DocumentsEvent, EventBus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

use crate::api::DocumentsApi;
use crate::demo::DemoDocuments;
use crate::error::DocumentsError;
use crate::models::{Document, DocumentListResponse, FilterState, ListQuery, PaginationInfo};
use crate::ui_state::{derive_ui_state, UiState};

/// Where the displayed documents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Nothing has been displayed yet
    None,
    /// Committed from the backend
    Live,
    /// Demo data shown because the backend was unreachable
    Demo,
}

/// One consistent view of the document list, published on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentListSnapshot {
    pub documents: Vec<Document>,
    pub pagination: PaginationInfo,
    /// Filters of the fetch whose result is displayed
    pub filters: FilterState,
    pub ui_state: UiState,
    /// A fetch is in flight or its result is settling
    pub is_loading: bool,
    /// Human-readable message of the last failure, cleared by the next fetch
    pub error: Option<String>,
    pub source: DataSource,
    /// Generation of the latest issued fetch
    pub generation: u64,
}

impl DocumentListSnapshot {
    fn initial(page_size: u32) -> Self {
        Self {
            documents: Vec::new(),
            pagination: PaginationInfo::empty(page_size),
            filters: FilterState::default(),
            ui_state: UiState::InitialLoading,
            is_loading: false,
            error: None,
            source: DataSource::None,
            generation: 0,
        }
    }

    /// Whether the renderer should offer a retry button.
    pub fn can_retry(&self) -> bool {
        self.ui_state == UiState::Error
    }

    pub fn is_demo(&self) -> bool {
        self.source == DataSource::Demo
    }
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// Successful non-empty result waiting for the settle delay.
struct PendingCommit {
    generation: u64,
    query: ListQuery,
    response: DocumentListResponse,
}

struct ControllerState {
    last_requested: ListQuery,
    in_flight: Option<InFlight>,
    pending_commit: Option<PendingCommit>,
    debounce: TimerSlot,
    settle: TimerSlot,
    documents: Vec<Document>,
    pagination: PaginationInfo,
    applied_filters: FilterState,
    source: DataSource,
    ui_state: UiState,
    error: Option<String>,
    has_ever_loaded: bool,
    disposed: bool,
}

impl ControllerState {
    fn is_loading(&self) -> bool {
        self.in_flight.is_some() || self.pending_commit.is_some()
    }
}

/// Side effects collected under the state lock and dispatched after it.
#[derive(Default)]
struct Effects {
    events: Vec<DocumentsEvent>,
    notifications: Vec<Notification>,
}

struct ControllerInner {
    api: Arc<dyn DocumentsApi>,
    settings: SyncSettings,
    notifier: Arc<dyn Notifier>,
    events: Option<EventBus>,
    generation: AtomicU64,
    state: Mutex<ControllerState>,
    snapshot_tx: watch::Sender<DocumentListSnapshot>,
    demo: DemoDocuments,
}

/// Debounced, cancelable, flicker-free document list controller.
///
/// Must be used from within a tokio runtime: scheduling spawns timer tasks.
///
/// ```ignore
/// let controller = DocumentSyncController::new(api, SyncSettings::default(), notifier);
/// let mut updates = controller.subscribe();
///
/// controller.request_load(ListQuery::new(1, 10).with_search("nfe"));
/// updates.changed().await?;
/// render(&updates.borrow());
/// ```
pub struct DocumentSyncController {
    inner: Arc<ControllerInner>,
}

impl DocumentSyncController {
    pub fn new(
        api: Arc<dyn DocumentsApi>,
        settings: SyncSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let initial_query = ListQuery::new(1, settings.default_page_size);
        let (snapshot_tx, _) =
            watch::channel(DocumentListSnapshot::initial(settings.default_page_size));

        let state = ControllerState {
            last_requested: initial_query,
            in_flight: None,
            pending_commit: None,
            debounce: TimerSlot::new("documents.debounce"),
            settle: TimerSlot::new("documents.settle"),
            documents: Vec::new(),
            pagination: PaginationInfo::empty(settings.default_page_size),
            applied_filters: FilterState::default(),
            source: DataSource::None,
            ui_state: UiState::InitialLoading,
            error: None,
            has_ever_loaded: false,
            disposed: false,
        };

        Self {
            inner: Arc::new(ControllerInner {
                api,
                settings,
                notifier,
                events: None,
                generation: AtomicU64::new(0),
                state: Mutex::new(state),
                snapshot_tx,
                demo: DemoDocuments::new(),
            }),
        }
    }

    /// Publish diagnostics on `bus`. Only effective right after construction.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.events = Some(bus),
            None => warn!("Event bus attached after the controller started; ignoring"),
        }
        self
    }

    /// Schedule a fetch for `query`.
    ///
    /// Calls within the debounce window coalesce into one fetch using the
    /// last parameters. If a fetch is still in flight when the window closes,
    /// the scheduled fetch is skipped; the parameters are kept for the next
    /// [`reload`](Self::reload) or [`refresh`](Self::refresh).
    pub fn request_load(&self, query: ListQuery) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }

        debug!(page = query.page, limit = query.limit, "Load requested");
        state.last_requested = query;

        let weak = Arc::downgrade(&self.inner);
        state.debounce.schedule(self.inner.settings.debounce, async move {
            if let Some(inner) = weak.upgrade() {
                inner.begin_fetch(false);
            }
        });
    }

    /// Fetch the most recently requested parameters now, superseding any
    /// fetch in flight.
    pub fn refresh(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.debounce.clear();
        }
        self.inner.begin_fetch(true);
    }

    /// Retry after a failure. Same as [`refresh`](Self::refresh).
    pub fn retry(&self) {
        info!("Retrying document fetch");
        self.refresh();
    }

    /// Re-request the current parameters through the debounce.
    pub fn reload(&self) {
        let query = self.inner.state.lock().last_requested.clone();
        self.request_load(query);
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> DocumentListSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<DocumentListSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn ui_state(&self) -> UiState {
        self.inner.state.lock().ui_state
    }

    /// Parameters of the most recent `request_load`
    pub fn last_requested(&self) -> ListQuery {
        self.inner.state.lock().last_requested.clone()
    }

    /// Generation of the latest issued fetch
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Cancel the fetch in flight and both timers. No later result is applied.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }
}

impl Drop for DocumentSyncController {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl ControllerInner {
    fn begin_fetch(self: &Arc<Self>, forced: bool) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }

            let query = state.last_requested.clone();

            if let Some(in_flight) = state.in_flight.take() {
                if !forced {
                    debug!(
                        generation = in_flight.generation,
                        page = query.page,
                        "Fetch already in flight; skipping"
                    );
                    state.in_flight = Some(in_flight);
                    effects
                        .events
                        .push(DocumentsEvent::FetchSkipped { page: query.page });
                    drop(state);
                    self.dispatch(effects);
                    return;
                }

                debug!(generation = in_flight.generation, "Superseding fetch in flight");
                in_flight.token.cancel();
            }

            // A settled result is the latest completed fetch: show it before
            // moving on.
            if let Some(pending) = state.pending_commit.take() {
                state.settle.clear();
                self.commit(&mut state, pending, &mut effects);
            }

            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let token = CancellationToken::new();
            state.in_flight = Some(InFlight {
                generation,
                token: token.clone(),
            });
            state.error = None;

            // Demo documents count as displayed data.
            let has_displayed = state.has_ever_loaded || state.source == DataSource::Demo;
            let next = derive_ui_state(
                true,
                has_displayed,
                state.documents.len(),
                state.documents.len(),
            );
            Self::set_ui_state(&mut state, next, &mut effects);

            effects.events.push(DocumentsEvent::FetchStarted {
                generation,
                page: query.page,
                forced,
            });
            debug!(generation, page = query.page, forced, "Fetch started");

            self.publish(&state);
            self.spawn_fetch(generation, query, token);
        }
        self.dispatch(effects);
    }

    fn spawn_fetch(self: &Arc<Self>, generation: u64, query: ListQuery, token: CancellationToken) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let api = Arc::clone(&self.api);
        let fetch_timeout = self.settings.fetch_timeout;

        core_async::spawn(async move {
            let outcome = core_async::select! {
                biased;
                _ = token.cancelled() => None,
                result = timeout(fetch_timeout, api.list(&query)) => Some(match result {
                    Ok(result) => result,
                    Err(_) => Err(DocumentsError::Timeout {
                        millis: fetch_timeout.as_millis() as u64,
                    }),
                }),
            };

            let Some(inner) = weak.upgrade() else {
                return;
            };

            match outcome {
                Some(result) => inner.finish_fetch(generation, query, result),
                None => inner.discard(generation),
            }
        });
    }

    fn discard(&self, generation: u64) {
        debug!(generation, "Cancelled fetch discarded");
        self.dispatch(Effects {
            events: vec![DocumentsEvent::FetchDiscarded { generation }],
            notifications: Vec::new(),
        });
    }

    fn finish_fetch(
        self: &Arc<Self>,
        generation: u64,
        query: ListQuery,
        result: Result<DocumentListResponse, DocumentsError>,
    ) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();

            let current = !state.disposed
                && self.generation.load(Ordering::SeqCst) == generation
                && state
                    .in_flight
                    .as_ref()
                    .is_some_and(|f| f.generation == generation);

            if !current {
                debug!(generation, "Superseded fetch result discarded");
                effects
                    .events
                    .push(DocumentsEvent::FetchDiscarded { generation });
                drop(state);
                self.dispatch(effects);
                return;
            }

            state.in_flight = None;

            match result {
                Ok(response) => self.accept(&mut state, generation, query, response, &mut effects),
                Err(error) => self.fail(&mut state, generation, &query, error, &mut effects),
            }

            self.publish(&state);
        }
        self.dispatch(effects);
    }

    fn accept(
        self: &Arc<Self>,
        state: &mut ControllerState,
        generation: u64,
        query: ListQuery,
        response: DocumentListResponse,
        effects: &mut Effects,
    ) {
        let pending = PendingCommit {
            generation,
            query,
            response,
        };

        // Emptiness is shown immediately; data goes through the settle delay.
        if pending.response.documents.is_empty() || self.settings.settle_delay.is_zero() {
            self.commit(state, pending, effects);
            return;
        }

        debug!(
            generation,
            count = pending.response.documents.len(),
            "Result settling"
        );
        state.pending_commit = Some(pending);

        let weak = Arc::downgrade(self);
        state.settle.schedule(self.settings.settle_delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.commit_settled(generation);
            }
        });
    }

    fn commit_settled(&self, generation: u64) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }

            let matches = state
                .pending_commit
                .as_ref()
                .is_some_and(|p| p.generation == generation);
            if !matches {
                return;
            }

            if let Some(pending) = state.pending_commit.take() {
                self.commit(&mut state, pending, &mut effects);
                self.publish(&state);
            }
        }
        self.dispatch(effects);
    }

    /// Replace documents, pagination and filters together.
    fn commit(&self, state: &mut ControllerState, pending: PendingCommit, effects: &mut Effects) {
        let PendingCommit {
            generation,
            query,
            response,
        } = pending;

        let previous_count = state.documents.len();
        let count = response.documents.len();

        state.documents = response.documents;
        state.pagination = response.pagination;
        state.applied_filters = query.filters;
        state.source = DataSource::Live;
        state.has_ever_loaded = true;
        state.error = None;

        let next = derive_ui_state(state.is_loading(), true, count, previous_count);
        Self::set_ui_state(state, next, effects);

        info!(
            generation,
            count,
            total = state.pagination.total_documents,
            "Documents committed"
        );
        effects.events.push(DocumentsEvent::FetchCompleted {
            generation,
            document_count: count as u32,
            total_documents: state.pagination.total_documents,
        });
    }

    fn fail(
        &self,
        state: &mut ControllerState,
        generation: u64,
        query: &ListQuery,
        failure: DocumentsError,
        effects: &mut Effects,
    ) {
        if failure.is_validation() {
            error!(
                generation,
                error_kind = failure.kind(),
                error = %failure,
                "Document list response failed validation"
            );
        } else {
            warn!(
                generation,
                error_kind = failure.kind(),
                error = %failure,
                "Document fetch failed"
            );
        }

        let message = failure.to_string();

        let nothing_shown = state.documents.is_empty() && !state.has_ever_loaded;
        if self.settings.demo_fallback && failure.is_recoverable() && nothing_shown {
            let demo = self.demo.page(query);
            info!(
                count = demo.documents.len(),
                reason = %message,
                "Showing demo documents"
            );
            state.documents = demo.documents;
            state.pagination = demo.pagination;
            state.applied_filters = query.filters.clone();
            state.source = DataSource::Demo;

            effects.events.push(DocumentsEvent::DemoModeActivated {
                reason: message.clone(),
            });
            effects.notifications.push(Notification::info(
                "Demo mode",
                "The server could not be reached. Showing sample documents.",
            ));
        }

        state.error = Some(message.clone());
        Self::set_ui_state(state, UiState::Error, effects);

        effects.events.push(DocumentsEvent::FetchFailed {
            generation,
            message: message.clone(),
            validation: failure.is_validation(),
        });
        effects
            .notifications
            .push(Notification::error("Failed to load documents", message));
    }

    fn set_ui_state(state: &mut ControllerState, next: UiState, effects: &mut Effects) {
        if state.ui_state != next {
            debug!(from = %state.ui_state, to = %next, "UI state changed");
            state.ui_state = next;
            effects.events.push(DocumentsEvent::UiStateChanged {
                state: next.as_str().to_string(),
            });
        }
    }

    fn publish(&self, state: &ControllerState) {
        self.snapshot_tx.send_replace(DocumentListSnapshot {
            documents: state.documents.clone(),
            pagination: state.pagination.clone(),
            filters: state.applied_filters.clone(),
            ui_state: state.ui_state,
            is_loading: state.is_loading(),
            error: state.error.clone(),
            source: state.source,
            generation: self.generation.load(Ordering::SeqCst),
        });
    }

    fn dispatch(&self, effects: Effects) {
        if let Some(bus) = &self.events {
            for event in effects.events {
                bus.emit(CoreEvent::Documents(event)).ok();
            }
        }
        for notification in effects.notifications {
            self.notifier.notify(notification);
        }
    }

    fn dispose(&self) {
        let mut state = self.state.lock();
        if state.disposed {
            return;
        }

        state.disposed = true;
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.token.cancel();
        }
        state.pending_commit = None;
        state.debounce.clear();
        state.settle.clear();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Document controller disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ProgressSink, UploadFile};
    use async_trait::async_trait;
    use bridge_traits::notification::NoopNotifier;

    struct EmptyApi;

    #[async_trait]
    impl DocumentsApi for EmptyApi {
        async fn list(&self, query: &ListQuery) -> crate::Result<DocumentListResponse> {
            Ok(DocumentListResponse {
                documents: Vec::new(),
                pagination: PaginationInfo::new(query.page, query.limit, 0),
                filters: query.filters.clone(),
            })
        }

        async fn upload(
            &self,
            _file: &UploadFile,
            _progress: Option<ProgressSink>,
        ) -> crate::Result<Document> {
            Err(DocumentsError::Transport("unsupported".to_string()))
        }
    }

    fn controller() -> DocumentSyncController {
        DocumentSyncController::new(
            Arc::new(EmptyApi),
            SyncSettings::default(),
            Arc::new(NoopNotifier),
        )
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let controller = controller();
        let snapshot = controller.snapshot();

        assert_eq!(snapshot.ui_state, UiState::InitialLoading);
        assert!(snapshot.documents.is_empty());
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.source, DataSource::None);
        assert_eq!(controller.last_requested(), ListQuery::new(1, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_commits_without_settle() {
        let controller = controller();
        let mut updates = controller.subscribe();

        controller.refresh();
        assert!(controller.snapshot().is_loading);

        loop {
            updates.changed().await.unwrap();
            if !updates.borrow().is_loading {
                break;
            }
        }

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.ui_state, UiState::Empty);
        assert_eq!(snapshot.source, DataSource::Live);
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let controller = controller();
        controller.dispose();
        controller.dispose();
        assert!(controller.is_disposed());
        assert_eq!(controller.generation(), 1);

        controller.request_load(ListQuery::new(2, 10));
        assert_eq!(controller.last_requested(), ListQuery::new(1, 10));
    }

    #[test]
    fn test_snapshot_retry_affordance() {
        let mut snapshot = DocumentListSnapshot::initial(10);
        assert!(!snapshot.can_retry());
        snapshot.ui_state = UiState::Error;
        assert!(snapshot.can_retry());
    }
}
