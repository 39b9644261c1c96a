//! Batch behavior of the upload pipeline against a scripted transport.
//!
//! Time is paused so transfer latency and simulated progress ticks advance
//! deterministically.

use async_trait::async_trait;
use bridge_desktop::MemoryNotifier;
use bridge_traits::notification::NotificationKind;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use core_documents::{
    Document, DocumentListResponse, DocumentStatus, DocumentsApi, DocumentsError, ListQuery,
    ProgressSink, Result, UploadFile,
};
use core_runtime::config::UploadSettings;
use core_runtime::events::{CoreEvent, EventBus, UploadEvent};
use core_upload::{UploadBatchReport, UploadPipeline, UploadStatus};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Scripted transport
// ============================================================================

struct Scripted {
    delay: Duration,
    result: std::result::Result<(), DocumentsError>,
}

/// Answers uploads per file name from scripted outcomes. Unscripted files
/// succeed after 100 ms. Tracks how many transfers overlap.
#[derive(Default)]
struct ScriptedUploadApi {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_id: AtomicI64,
}

impl ScriptedUploadApi {
    fn succeed(&self, file_name: &str, delay_ms: u64) {
        self.script(file_name, delay_ms, Ok(()));
    }

    fn fail(&self, file_name: &str, delay_ms: u64, error: DocumentsError) {
        self.script(file_name, delay_ms, Err(error));
    }

    fn script(
        &self,
        file_name: &str,
        delay_ms: u64,
        result: std::result::Result<(), DocumentsError>,
    ) {
        self.scripts
            .lock()
            .entry(file_name.to_string())
            .or_default()
            .push_back(Scripted {
                delay: Duration::from_millis(delay_ms),
                result,
            });
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentsApi for ScriptedUploadApi {
    async fn list(&self, _query: &ListQuery) -> Result<DocumentListResponse> {
        Err(DocumentsError::Transport("not scripted".to_string()))
    }

    async fn upload(&self, file: &UploadFile, _progress: Option<ProgressSink>) -> Result<Document> {
        self.calls.lock().push(file.file_name.clone());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let step = self
            .scripts
            .lock()
            .get_mut(&file.file_name)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Scripted {
                delay: Duration::from_millis(100),
                result: Ok(()),
            });

        tokio::time::sleep(step.delay).await;
        step.result?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Document {
            id,
            filename: format!("{}_{}", id, file.file_name),
            original_filename: file.file_name.clone(),
            file_size: file.size(),
            mime_type: file.content_type.clone(),
            status: DocumentStatus::Pending,
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            processed_at: None,
            user_id: 5,
            processing_result: None,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn file(name: &str, content_type: &str) -> UploadFile {
    UploadFile::new(name, content_type, Bytes::from_static(b"fiscal document bytes"))
}

fn pdf(name: &str) -> UploadFile {
    file(name, "application/pdf")
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

struct Harness {
    api: Arc<ScriptedUploadApi>,
    notifier: Arc<MemoryNotifier>,
    bus: EventBus,
    /// Number of transfers started at the time of each refresh
    refreshes: Arc<Mutex<Vec<usize>>>,
    pipeline: UploadPipeline,
}

fn harness_with(settings: UploadSettings) -> Harness {
    let api = Arc::new(ScriptedUploadApi::default());
    let notifier = Arc::new(MemoryNotifier::new());
    let bus = EventBus::new(512);
    let refreshes = Arc::new(Mutex::new(Vec::new()));

    let trigger = {
        let api = api.clone();
        let refreshes = refreshes.clone();
        Arc::new(move || refreshes.lock().push(api.calls().len()))
    };

    let pipeline = UploadPipeline::new(api.clone(), settings, notifier.clone())
        .with_events(bus.clone())
        .with_refresh_trigger(trigger);

    Harness {
        api,
        notifier,
        bus,
        refreshes,
        pipeline,
    }
}

fn harness() -> Harness {
    harness_with(UploadSettings::default())
}

fn titles(notifier: &MemoryNotifier, kind: NotificationKind) -> Vec<String> {
    notifier.of_kind(kind).into_iter().map(|n| n.title).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn failure_is_isolated_and_invalid_files_never_upload() {
    let h = harness();
    h.api.succeed("a.pdf", 200);
    h.api.fail(
        "c.pdf",
        100,
        DocumentsError::HttpStatus {
            status: 500,
            message: "storage unavailable".to_string(),
        },
    );

    let report = h
        .pipeline
        .add_files(vec![pdf("a.pdf"), file("b.txt", "text/plain"), pdf("c.pdf")])
        .await;

    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].file_name, "b.txt");
    assert!(report.rejected[0].error.is_validation());
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.is_clean());

    assert_eq!(h.api.calls(), vec!["a.pdf", "c.pdf"]);

    let entries = h.pipeline.entries();
    assert_eq!(entries.len(), 2, "rejected file never becomes an entry");
    assert_eq!(entries[0].file_name(), "a.pdf");
    assert_eq!(entries[0].status, UploadStatus::Success);
    assert_eq!(entries[0].progress, 100);
    assert_eq!(entries[1].file_name(), "c.pdf");
    assert_eq!(entries[1].status, UploadStatus::Error);
    assert_eq!(entries[1].progress, 0);
    assert!(entries[1]
        .error
        .as_deref()
        .unwrap()
        .contains("storage unavailable"));

    assert_eq!(
        titles(&h.notifier, NotificationKind::Error),
        vec!["Invalid file type", "Upload failed"]
    );
    assert_eq!(
        titles(&h.notifier, NotificationKind::Success),
        vec!["Upload complete"]
    );
}

#[tokio::test(start_paused = true)]
async fn text_file_is_rejected_without_network_call() {
    let h = harness();
    let mut stream = h.bus.stream();

    let report = h.pipeline.add_files(vec![file("notes.txt", "text/plain")]).await;

    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.attempted(), 0);
    assert!(h.pipeline.entries().is_empty());
    assert!(h.api.calls().is_empty());
    assert!(h.refreshes.lock().is_empty());

    let errors = h.notifier.of_kind(NotificationKind::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Invalid file type");
    assert!(errors[0].description.contains("notes.txt"));

    assert!(matches!(
        stream.drain().as_slice(),
        [CoreEvent::Upload(UploadEvent::FileRejected { file_name, .. })] if file_name == "notes.txt"
    ));
}

#[tokio::test(start_paused = true)]
async fn each_rejected_file_gets_its_own_notification() {
    let h = harness_with(UploadSettings::default().with_max_file_size(8));

    let report = h
        .pipeline
        .add_files(vec![
            file("a.txt", "text/plain"),
            file("b.zip", "application/zip"),
            pdf("big.pdf"),
        ])
        .await;

    assert_eq!(report.rejected.len(), 3);
    assert_eq!(
        titles(&h.notifier, NotificationKind::Error),
        vec!["Invalid file type", "Invalid file type", "File too large"]
    );
}

#[tokio::test(start_paused = true)]
async fn uploads_run_one_at_a_time_in_submission_order() {
    let h = harness();
    h.api.succeed("first.pdf", 300);
    h.api.succeed("second.pdf", 50);
    h.api.succeed("third.pdf", 150);

    let report = h
        .pipeline
        .add_files(vec![pdf("first.pdf"), pdf("second.pdf"), pdf("third.pdf")])
        .await;

    assert_eq!(report.succeeded.len(), 3);
    assert_eq!(h.api.calls(), vec!["first.pdf", "second.pdf", "third.pdf"]);
    assert_eq!(h.api.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_batches_never_overlap_transfers() {
    let h = harness();
    h.api.succeed("a1.pdf", 400);
    h.api.succeed("b1.pdf", 100);

    let first = {
        let pipeline = h.pipeline.clone();
        tokio::spawn(async move { pipeline.add_files(vec![pdf("a1.pdf"), pdf("a2.pdf")]).await })
    };
    advance(10).await;
    let second = {
        let pipeline = h.pipeline.clone();
        tokio::spawn(async move { pipeline.add_files(vec![pdf("b1.pdf")]).await })
    };

    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert_eq!(first.succeeded.len(), 2);
    assert_eq!(second.succeeded.len(), 1);
    assert_eq!(h.api.calls(), vec!["a1.pdf", "a2.pdf", "b1.pdf"]);
    assert_eq!(h.api.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_runs_after_every_file_regardless_of_outcome() {
    let h = harness();
    h.api.fail("a.pdf", 100, DocumentsError::Transport("connection reset".to_string()));
    h.api.succeed("b.pdf", 100);
    h.api.succeed("c.pdf", 100);

    h.pipeline
        .add_files(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await;

    // one refresh per file, each before the next transfer starts
    assert_eq!(*h.refreshes.lock(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn simulated_progress_climbs_to_cap_then_jumps_to_complete() {
    let h = harness_with(UploadSettings::default().with_progress(
        Duration::from_millis(200),
        10,
        90,
    ));
    h.api.succeed("slow.pdf", 5_000);
    let mut stream = h.bus.stream();

    let task = {
        let pipeline = h.pipeline.clone();
        tokio::spawn(async move { pipeline.add_files(vec![pdf("slow.pdf")]).await })
    };

    advance(1_050).await;
    let entry = h.pipeline.entries().remove(0);
    assert_eq!(entry.status, UploadStatus::Uploading);
    assert_eq!(entry.progress, 50);
    assert!(h.pipeline.is_uploading());

    advance(3_000).await;
    let entry = h.pipeline.entries().remove(0);
    assert_eq!(entry.status, UploadStatus::Uploading);
    assert_eq!(entry.progress, 90, "held at the cap while the transfer is outstanding");

    task.await.unwrap();
    let entry = h.pipeline.entries().remove(0);
    assert_eq!(entry.status, UploadStatus::Success);
    assert_eq!(entry.progress, 100);

    let percents: Vec<u8> = stream
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Upload(UploadEvent::Progress { percent, .. }) => Some(percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);
}

#[tokio::test(start_paused = true)]
async fn simulation_stops_when_transfer_resolves() {
    let h = harness_with(UploadSettings::default().with_progress(
        Duration::from_millis(200),
        10,
        90,
    ));
    h.api.succeed("quick.pdf", 300);

    h.pipeline.add_files(vec![pdf("quick.pdf")]).await;
    let mut updates = h.pipeline.subscribe();
    updates.borrow_and_update();

    advance(2_000).await;

    assert!(!updates.has_changed().unwrap(), "no tick after completion");
    let entry = h.pipeline.entries().remove(0);
    assert_eq!(entry.progress, 100);
    assert_eq!(entry.status, UploadStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn removing_a_pending_entry_skips_its_upload() {
    let h = harness();
    h.api.succeed("a.pdf", 1_000);

    let task = {
        let pipeline = h.pipeline.clone();
        tokio::spawn(async move { pipeline.add_files(vec![pdf("a.pdf"), pdf("b.pdf")]).await })
    };
    advance(10).await;

    let pending = h
        .pipeline
        .entries()
        .into_iter()
        .find(|e| e.status == UploadStatus::Pending)
        .unwrap();
    assert_eq!(pending.file_name(), "b.pdf");
    h.pipeline.remove_entry(pending.id).unwrap();

    let report = task.await.unwrap();
    assert_eq!(report.skipped, vec![pending.id]);
    assert_eq!(h.api.calls(), vec!["a.pdf"]);
    assert_eq!(h.pipeline.entries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dismissing_an_in_flight_entry_does_not_cancel_the_transfer() {
    let h = harness();
    h.api.succeed("a.pdf", 1_000);

    let task = {
        let pipeline = h.pipeline.clone();
        tokio::spawn(async move { pipeline.add_files(vec![pdf("a.pdf")]).await })
    };
    advance(10).await;

    let uploading = h.pipeline.entries().remove(0);
    assert_eq!(uploading.status, UploadStatus::Uploading);
    let removed = h.pipeline.remove_entry(uploading.id).unwrap();
    assert_eq!(removed.status, UploadStatus::Uploading);
    assert!(h.pipeline.entries().is_empty());

    let report = task.await.unwrap();
    assert_eq!(report.succeeded, vec![uploading.id]);
    assert!(h.pipeline.entries().is_empty());
    assert_eq!(titles(&h.notifier, NotificationKind::Success), vec!["Upload complete"]);
    assert_eq!(*h.refreshes.lock(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn failed_entries_can_be_retried() {
    let h = harness();
    h.api.fail("nfe.xml", 100, DocumentsError::Transport("offline".to_string()));
    h.api.succeed("nfe.xml", 100);

    let report = h.pipeline.add_files(vec![file("nfe.xml", "text/xml")]).await;
    assert_eq!(report.failed.len(), 1);
    let failed_id = report.failed[0];

    let retry = h.pipeline.retry_failed().await;
    assert_eq!(retry.succeeded.len(), 1);
    let retried_id = retry.succeeded[0];
    assert_ne!(retried_id, failed_id, "a retry gets a fresh entry");
    assert!(h.pipeline.entry(failed_id).is_none());

    let entries = h.pipeline.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, retried_id);
    assert_eq!(entries[0].status, UploadStatus::Success);
    assert!(entries[0].error.is_none());
    assert_eq!(entries[0].document_id, Some(1));
    assert_eq!(h.api.calls(), vec!["nfe.xml", "nfe.xml"]);

    assert_eq!(h.pipeline.retry_failed().await, UploadBatchReport::default());
}

#[tokio::test(start_paused = true)]
async fn retry_replaces_failed_entries_in_place() {
    let h = harness();
    h.api.fail("a.pdf", 100, DocumentsError::Transport("offline".to_string()));
    h.api.succeed("b.pdf", 100);
    h.api.succeed("a.pdf", 100);

    let report = h.pipeline.add_files(vec![pdf("a.pdf"), pdf("b.pdf")]).await;
    let failed_id = report.failed[0];
    let kept_id = report.succeeded[0];
    let mut stream = h.bus.stream();

    let retry = h.pipeline.retry_failed().await;
    let retried_id = retry.succeeded[0];

    let entries = h.pipeline.entries();
    let order: Vec<_> = entries.iter().map(|e| e.id).collect();
    assert_eq!(order, vec![retried_id, kept_id]);
    assert_eq!(entries[0].file_name(), "a.pdf");

    let events = stream.drain();
    let removed = events.iter().position(|e| {
        matches!(e, CoreEvent::Upload(UploadEvent::EntryRemoved { entry_id })
            if *entry_id == failed_id.to_string())
    });
    let queued = events.iter().position(|e| {
        matches!(e, CoreEvent::Upload(UploadEvent::FileQueued { entry_id, .. })
            if *entry_id == retried_id.to_string())
    });
    assert!(removed.is_some());
    assert!(removed < queued);
}

#[tokio::test(start_paused = true)]
async fn transfer_exceeding_timeout_fails_the_entry() {
    let h = harness_with(UploadSettings::default().with_upload_timeout(Duration::from_secs(2)));
    h.api.succeed("hang.pdf", 60_000);
    h.api.succeed("next.pdf", 100);

    let report = h
        .pipeline
        .add_files(vec![pdf("hang.pdf"), pdf("next.pdf")])
        .await;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.succeeded.len(), 1);
    let entries = h.pipeline.entries();
    assert_eq!(entries[0].status, UploadStatus::Error);
    assert!(entries[0].error.as_deref().unwrap().contains("timed out"));
    assert_eq!(entries[1].status, UploadStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn clear_finished_dismisses_terminal_entries() {
    let h = harness();
    h.api.fail("bad.pdf", 50, DocumentsError::Transport("reset".to_string()));

    h.pipeline
        .add_files(vec![pdf("ok.pdf"), pdf("bad.pdf")])
        .await;
    let mut stream = h.bus.stream();

    assert_eq!(h.pipeline.clear_finished(), 2);
    assert!(h.pipeline.entries().is_empty());
    assert_eq!(h.pipeline.clear_finished(), 0);

    let removed = stream
        .drain()
        .into_iter()
        .filter(|e| matches!(e, CoreEvent::Upload(UploadEvent::EntryRemoved { .. })))
        .count();
    assert_eq!(removed, 2);
}

#[tokio::test(start_paused = true)]
async fn lifecycle_events_are_published_in_order() {
    let h = harness_with(UploadSettings::default().with_progress(
        Duration::from_millis(1_000),
        10,
        90,
    ));
    h.api.succeed("a.pdf", 100);
    let mut stream = h.bus.stream();

    h.pipeline.add_files(vec![pdf("a.pdf")]).await;

    let kinds: Vec<&'static str> = stream
        .drain()
        .iter()
        .filter_map(|event| match event {
            CoreEvent::Upload(UploadEvent::FileQueued { .. }) => Some("queued"),
            CoreEvent::Upload(UploadEvent::Started { .. }) => Some("started"),
            CoreEvent::Upload(UploadEvent::Completed { document_id: 1, .. }) => Some("completed"),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec!["queued", "started", "completed"]);
}
