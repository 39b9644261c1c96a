//! # Upload Pipeline
//!
//! Validates selected files, registers one [`FileUploadEntry`] per accepted
//! file and uploads them strictly one after another.
//!
//! ```text
//! add_files ──validate──> rejected: notify, no entry
//!     │
//!     └──> entries (pending) ──upload_all──> [gate] ──> upload_one ──> upload_one ...
//!                                                          │
//!                                    progress (simulated or reported) while in flight
//!                                                          │
//!                                      success / error ──> notify ──> refresh trigger
//! ```
//!
//! A failed transfer only affects its own entry; the batch continues. The
//! refresh trigger runs after every file so the document list catches up
//! without waiting for the whole batch.

use bridge_traits::notification::{Notification, Notifier};
use core_async::sync::{watch, Mutex as AsyncMutex};
use core_async::time::timeout;
use core_documents::{DocumentsApi, UploadFile};
use core_runtime::config::UploadSettings;
use core_runtime::events::{CoreEvent, EventBus, UploadEvent};
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::entry::{EntryId, FileUploadEntry, UploadStatus};
use crate::error::{Result, UploadError};
use crate::progress::{reported, ProgressSimulator, ProgressTracker};
use crate::validation::FileValidator;

/// Invoked after each file finishes, whatever the outcome.
pub type RefreshTrigger = Arc<dyn Fn() + Send + Sync>;

const ACCEPTED_FORMATS: &str = "PDF, JPEG, PNG, DOCX, DOC, XML";

fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// A file that never became an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub file_name: String,
    pub content_type: String,
    pub error: UploadError,
}

/// Outcome of one `add_files`, `upload_all` or `retry_failed` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatchReport {
    pub succeeded: Vec<EntryId>,
    pub failed: Vec<EntryId>,
    pub rejected: Vec<RejectedFile>,
    /// Dismissed or no longer pending when their turn came
    pub skipped: Vec<EntryId>,
}

impl UploadBatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    fn merge(&mut self, other: UploadBatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
        self.rejected.extend(other.rejected);
        self.skipped.extend(other.skipped);
    }
}

enum Outcome {
    Succeeded,
    Failed,
    Skipped,
}

struct PipelineInner {
    api: Arc<dyn DocumentsApi>,
    settings: UploadSettings,
    validator: FileValidator,
    notifier: Arc<dyn Notifier>,
    events: Option<EventBus>,
    refresh: Option<RefreshTrigger>,
    entries: Mutex<Vec<FileUploadEntry>>,
    /// Held for the duration of a batch so transfers never overlap
    gate: AsyncMutex<()>,
    entries_tx: watch::Sender<Vec<FileUploadEntry>>,
}

/// Sequential uploader with per-file progress and status.
///
/// Cloning is cheap and shares the same queue.
///
/// ```ignore
/// let pipeline = UploadPipeline::new(api, UploadSettings::default(), notifier)
///     .with_refresh_trigger(Arc::new(move || controller.reload()));
///
/// let report = pipeline.add_files(selected).await;
/// println!("{} uploaded, {} failed", report.succeeded.len(), report.failed.len());
/// ```
#[derive(Clone)]
pub struct UploadPipeline {
    inner: Arc<PipelineInner>,
}

impl UploadPipeline {
    pub fn new(
        api: Arc<dyn DocumentsApi>,
        settings: UploadSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (entries_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(PipelineInner {
                api,
                validator: FileValidator::new(&settings),
                settings,
                notifier,
                events: None,
                refresh: None,
                entries: Mutex::new(Vec::new()),
                gate: AsyncMutex::new(()),
                entries_tx,
            }),
        }
    }

    /// Only effective right after construction.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.events = Some(bus),
            None => warn!("Event bus attached to a shared pipeline; ignoring"),
        }
        self
    }

    /// Only effective right after construction.
    pub fn with_refresh_trigger(mut self, refresh: RefreshTrigger) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.refresh = Some(refresh),
            None => warn!("Refresh trigger attached to a shared pipeline; ignoring"),
        }
        self
    }

    /// Validate `files`, register the accepted ones and upload them.
    ///
    /// Every rejected file gets its own notification; rejections never abort
    /// the batch. Resolves once all accepted files reached a terminal state.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn add_files(&self, files: Vec<UploadFile>) -> UploadBatchReport {
        let mut report = UploadBatchReport::default();
        let mut queued = Vec::new();

        {
            let mut entries = self.inner.entries.lock();
            for mut file in files {
                match self.inner.validator.validate(&file) {
                    Ok(content_type) => {
                        file.content_type = content_type;
                        let entry = FileUploadEntry::new(file);
                        queued.push((entry.id, entry.file.file_name.clone()));
                        entries.push(entry);
                    }
                    Err(error) => report.rejected.push(RejectedFile {
                        file_name: file.file_name,
                        content_type: file.content_type,
                        error,
                    }),
                }
            }

            if !queued.is_empty() {
                self.inner.publish(&entries);
            }
        }

        for rejected in &report.rejected {
            self.inner.reject(rejected);
        }

        for (id, file_name) in &queued {
            debug!(entry = %id, file = %strip_path(file_name), "File queued");
            self.inner.emit(UploadEvent::FileQueued {
                entry_id: id.to_string(),
                file_name: file_name.clone(),
            });
        }

        let ids: Vec<EntryId> = queued.into_iter().map(|(id, _)| id).collect();
        if !ids.is_empty() {
            report.merge(self.upload_all(&ids).await);
        }

        report
    }

    /// Upload the given pending entries in order, one at a time.
    ///
    /// Concurrent calls queue behind each other. Entries that were dismissed
    /// or are not pending when their turn comes are skipped.
    pub async fn upload_all(&self, ids: &[EntryId]) -> UploadBatchReport {
        let _gate = self.inner.gate.lock().await;
        let mut report = UploadBatchReport::default();

        for &id in ids {
            match self.inner.upload_one(id).await {
                Outcome::Succeeded => report.succeeded.push(id),
                Outcome::Failed => report.failed.push(id),
                Outcome::Skipped => report.skipped.push(id),
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Upload batch finished"
        );
        report
    }

    /// Upload every failed file again.
    ///
    /// Each failed entry is replaced, in place, by a fresh pending entry with
    /// a new id; entries are never reused across uploads.
    pub async fn retry_failed(&self) -> UploadBatchReport {
        let replaced: Vec<(EntryId, EntryId, String)> = {
            let mut entries = self.inner.entries.lock();
            let mut replaced = Vec::new();
            for slot in entries.iter_mut() {
                if slot.status != UploadStatus::Error {
                    continue;
                }
                let fresh = FileUploadEntry::new(slot.file.clone());
                replaced.push((slot.id, fresh.id, fresh.file.file_name.clone()));
                *slot = fresh;
            }
            if !replaced.is_empty() {
                self.inner.publish(&entries);
            }
            replaced
        };

        if replaced.is_empty() {
            return UploadBatchReport::default();
        }

        for (old_id, new_id, file_name) in &replaced {
            debug!(
                old = %old_id,
                entry = %new_id,
                file = %strip_path(file_name),
                "Failed entry requeued"
            );
            self.inner.emit(UploadEvent::EntryRemoved {
                entry_id: old_id.to_string(),
            });
            self.inner.emit(UploadEvent::FileQueued {
                entry_id: new_id.to_string(),
                file_name: file_name.clone(),
            });
        }

        let ids: Vec<EntryId> = replaced.into_iter().map(|(_, id, _)| id).collect();
        info!(count = ids.len(), "Retrying failed uploads");
        self.upload_all(&ids).await
    }

    /// Dismiss an entry from the visible queue.
    ///
    /// A transfer already in flight is not cancelled; its outcome is still
    /// notified and still triggers a refresh.
    pub fn remove_entry(&self, id: EntryId) -> Result<FileUploadEntry> {
        let removed = {
            let mut entries = self.inner.entries.lock();
            let index = entries
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| UploadError::EntryNotFound(id.to_string()))?;
            let removed = entries.remove(index);
            self.inner.publish(&entries);
            removed
        };

        debug!(entry = %id, status = %removed.status, "Entry dismissed");
        self.inner.emit(UploadEvent::EntryRemoved {
            entry_id: id.to_string(),
        });
        Ok(removed)
    }

    /// Dismiss all entries in a terminal state. Returns how many were removed.
    pub fn clear_finished(&self) -> usize {
        let removed: Vec<EntryId> = {
            let mut entries = self.inner.entries.lock();
            let removed = entries
                .iter()
                .filter(|e| e.status.is_terminal())
                .map(|e| e.id)
                .collect::<Vec<_>>();
            if !removed.is_empty() {
                entries.retain(|e| !e.status.is_terminal());
                self.inner.publish(&entries);
            }
            removed
        };

        for id in &removed {
            self.inner.emit(UploadEvent::EntryRemoved {
                entry_id: id.to_string(),
            });
        }
        removed.len()
    }

    pub fn entries(&self) -> Vec<FileUploadEntry> {
        self.inner.entries.lock().clone()
    }

    pub fn entry(&self, id: EntryId) -> Option<FileUploadEntry> {
        self.inner.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Receive the entry list after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<FileUploadEntry>> {
        self.inner.entries_tx.subscribe()
    }

    pub fn is_uploading(&self) -> bool {
        self.inner
            .entries
            .lock()
            .iter()
            .any(|e| e.status == UploadStatus::Uploading)
    }
}

impl PipelineInner {
    async fn upload_one(self: &Arc<Self>, id: EntryId) -> Outcome {
        let file = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
                debug!(entry = %id, "Entry dismissed before upload; skipping");
                return Outcome::Skipped;
            };
            if let Err(err) = entry.start() {
                debug!(entry = %id, error = %err, "Entry not pending; skipping");
                return Outcome::Skipped;
            }
            let file = entry.file.clone();
            self.publish(&entries);
            file
        };

        info!(
            entry = %id,
            file = %strip_path(&file.file_name),
            size = file.size(),
            "Uploading file"
        );
        self.emit(UploadEvent::Started {
            entry_id: id.to_string(),
            file_name: file.file_name.clone(),
        });

        let tracker = self.progress_tracker(id);
        let transfer = self.api.upload(&file, tracker.sink());
        let result = match timeout(self.settings.upload_timeout, transfer).await {
            Ok(Ok(document)) => Ok(document),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!(
                "Upload timed out after {}s",
                self.settings.upload_timeout.as_secs()
            )),
        };
        tracker.finish();

        let outcome = match result {
            Ok(document) => {
                self.update_entry(id, |entry| entry.complete(document.id));
                info!(entry = %id, document_id = document.id, "Upload complete");
                self.emit(UploadEvent::Completed {
                    entry_id: id.to_string(),
                    document_id: document.id,
                });
                self.notifier.notify(Notification::success(
                    "Upload complete",
                    format!("{} was uploaded successfully", file.file_name),
                ));
                Outcome::Succeeded
            }
            Err(message) => {
                let error = UploadError::Transfer {
                    file_name: strip_path(&file.file_name).to_string(),
                    message: message.clone(),
                };
                warn!(entry = %id, error = %error, "Upload failed");
                self.update_entry(id, |entry| entry.fail(message.clone()));
                self.emit(UploadEvent::Failed {
                    entry_id: id.to_string(),
                    message: message.clone(),
                });
                self.notifier.notify(Notification::error(
                    "Upload failed",
                    format!("{}: {}", file.file_name, message),
                ));
                Outcome::Failed
            }
        };

        if let Some(refresh) = &self.refresh {
            debug!(entry = %id, "Triggering document refresh");
            refresh();
        }

        outcome
    }

    fn progress_tracker(self: &Arc<Self>, id: EntryId) -> ProgressTracker {
        let weak = Arc::downgrade(self);
        let on_progress = move |percent: u8| {
            if let Some(inner) = weak.upgrade() {
                inner.set_progress(id, percent);
            }
        };

        if self.api.reports_progress() {
            ProgressTracker::Reported(reported(on_progress))
        } else {
            ProgressTracker::Simulated(ProgressSimulator::start(
                self.settings.progress_tick,
                self.settings.progress_step,
                self.settings.progress_cap,
                on_progress,
            ))
        }
    }

    fn set_progress(&self, id: EntryId, percent: u8) {
        let progress = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
                return;
            };
            if !entry.advance_progress(percent) {
                return;
            }
            let progress = entry.progress;
            self.publish(&entries);
            progress
        };

        self.emit(UploadEvent::Progress {
            entry_id: id.to_string(),
            percent: progress,
        });
    }

    fn update_entry<F>(&self, id: EntryId, apply: F)
    where
        F: FnOnce(&mut FileUploadEntry) -> Result<()>,
    {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            debug!(entry = %id, "Entry dismissed during transfer");
            return;
        };
        if let Err(err) = apply(entry) {
            warn!(entry = %id, error = %err, "Entry update rejected");
            return;
        }
        self.publish(&entries);
    }

    fn reject(&self, rejected: &RejectedFile) {
        warn!(
            file = %strip_path(&rejected.file_name),
            content_type = %rejected.content_type,
            error = %rejected.error,
            error_kind = "validation",
            "File rejected"
        );

        let notification = match &rejected.error {
            UploadError::FileTooLarge { max, .. } => Notification::error(
                "File too large",
                format!("{} exceeds the {} limit", rejected.file_name, format_size(*max)),
            ),
            _ => Notification::error(
                "Invalid file type",
                format!(
                    "{} is not a supported format. Accepted formats: {}",
                    rejected.file_name, ACCEPTED_FORMATS
                ),
            ),
        };
        self.notifier.notify(notification);

        self.emit(UploadEvent::FileRejected {
            file_name: rejected.file_name.clone(),
            content_type: rejected.content_type.clone(),
            reason: rejected.error.to_string(),
        });
    }

    fn publish(&self, entries: &[FileUploadEntry]) {
        self.entries_tx.send_replace(entries.to_vec());
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Upload(event)).ok();
        }
    }
}
