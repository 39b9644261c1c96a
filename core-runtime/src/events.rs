//! # Event Bus System
//!
//! Event-driven diagnostics for the dashboard core using a broadcast channel.
//! Domain components publish typed events; hosts (devtools panels, telemetry,
//! tests) subscribe independently.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐  emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ DocumentSyncController├───────>│           ├────────────>│ Subscriber │
//! └──────────────────────┘         │ EventBus  │             └────────────┘
//! ┌──────────────────────┐  emit   │ (broadcast│  subscribe  ┌────────────┐
//! │ UploadPipeline       ├────────>│  channel) ├────────────>│ Subscriber │
//! └──────────────────────┘         └───────────┘             └────────────┘
//! ```
//!
//! Events are informational. Rendering state lives in the snapshots exposed by
//! the controller and the pipeline; nothing depends on an event being delivered.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, DocumentsEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Documents(DocumentsEvent::FetchDiscarded { generation: 3 }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Superseded document fetch discarded");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber was too slow and missed `n` events.
//!   Non-fatal.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! `emit` fails when nobody is subscribed; publishers ignore that with `.ok()`.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Document list synchronization
    Documents(DocumentsEvent),
    /// File upload pipeline
    Upload(UploadEvent),
}

impl CoreEvent {
    /// Short human-readable description of the event
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Documents(e) => e.description(),
            CoreEvent::Upload(e) => e.description(),
        }
    }

    /// Severity used by hosts to route events
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Documents(DocumentsEvent::FetchFailed { .. }) => EventSeverity::Error,
            CoreEvent::Upload(UploadEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Documents(DocumentsEvent::DemoModeActivated { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Upload(UploadEvent::FileRejected { .. }) => EventSeverity::Warning,
            CoreEvent::Documents(DocumentsEvent::FetchCompleted { .. }) => EventSeverity::Info,
            CoreEvent::Upload(UploadEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Document Events
// ============================================================================

/// Events from the document list synchronization controller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DocumentsEvent {
    /// A network fetch was issued
    FetchStarted {
        generation: u64,
        page: u32,
        /// `true` when a manual refresh bypassed the in-flight guard
        forced: bool,
    },
    /// A scheduled fetch was skipped because another one is in flight
    FetchSkipped { page: u32 },
    /// The authoritative fetch succeeded
    FetchCompleted {
        generation: u64,
        document_count: u32,
        total_documents: u64,
    },
    /// The authoritative fetch failed
    FetchFailed {
        generation: u64,
        message: String,
        /// `true` for malformed payloads, `false` for transport failures
        validation: bool,
    },
    /// A superseded or cancelled fetch finished and was dropped
    FetchDiscarded { generation: u64 },
    /// The derived UI state changed
    UiStateChanged { state: String },
    /// The demo data set is being displayed
    DemoModeActivated { reason: String },
}

impl DocumentsEvent {
    fn description(&self) -> &str {
        match self {
            DocumentsEvent::FetchStarted { .. } => "Document fetch started",
            DocumentsEvent::FetchSkipped { .. } => "Document fetch skipped (already in flight)",
            DocumentsEvent::FetchCompleted { .. } => "Document fetch completed",
            DocumentsEvent::FetchFailed { .. } => "Document fetch failed",
            DocumentsEvent::FetchDiscarded { .. } => "Superseded document fetch discarded",
            DocumentsEvent::UiStateChanged { .. } => "Document list state changed",
            DocumentsEvent::DemoModeActivated { .. } => "Demo data displayed",
        }
    }
}

// ============================================================================
// Upload Events
// ============================================================================

/// Events from the upload pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum UploadEvent {
    /// A selected file failed local validation and was never queued
    FileRejected {
        file_name: String,
        content_type: String,
        reason: String,
    },
    /// A file was accepted and queued
    FileQueued { entry_id: String, file_name: String },
    /// The transfer of a file began
    Started { entry_id: String, file_name: String },
    /// Progress update (simulated or reported)
    Progress { entry_id: String, percent: u8 },
    /// Transfer finished successfully
    Completed { entry_id: String, document_id: i64 },
    /// Transfer failed
    Failed { entry_id: String, message: String },
    /// The entry was dismissed from the visible queue
    EntryRemoved { entry_id: String },
}

impl UploadEvent {
    fn description(&self) -> &str {
        match self {
            UploadEvent::FileRejected { .. } => "File rejected",
            UploadEvent::FileQueued { .. } => "File queued for upload",
            UploadEvent::Started { .. } => "Upload started",
            UploadEvent::Progress { .. } => "Upload in progress",
            UploadEvent::Completed { .. } => "Upload completed",
            UploadEvent::Failed { .. } => "Upload failed",
            UploadEvent::EntryRemoved { .. } => "Upload entry dismissed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for core events.
///
/// Cloning is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns the number of subscribers that received it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe through a filterable [`EventStream`]
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper with an optional predicate
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map(|f| f(event)).unwrap_or(true)
    }

    /// Wait for the next matching event
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). `None` means no event is buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drain every matching event currently buffered
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_upload() -> CoreEvent {
        CoreEvent::Upload(UploadEvent::Failed {
            entry_id: "e1".to_string(),
            message: "HTTP 500".to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(failed_upload()).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let event = CoreEvent::Documents(DocumentsEvent::FetchStarted {
            generation: 1,
            page: 1,
            forced: false,
        });

        assert_eq!(bus.emit(event.clone()).unwrap(), 1);
        assert_eq!(sub.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_filter() {
        let bus = EventBus::new(10);
        let mut uploads = bus
            .stream()
            .filter(|event| matches!(event, CoreEvent::Upload(_)));

        bus.emit(CoreEvent::Documents(DocumentsEvent::FetchSkipped { page: 2 }))
            .unwrap();
        bus.emit(failed_upload()).unwrap();

        assert_eq!(uploads.recv().await.unwrap(), failed_upload());
        assert!(uploads.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_event_stream_drain() {
        let bus = EventBus::new(10);
        let mut stream = bus.stream();

        for generation in 1..=3 {
            bus.emit(CoreEvent::Documents(DocumentsEvent::FetchDiscarded {
                generation,
            }))
            .unwrap();
        }

        assert_eq!(stream.drain().len(), 3);
        assert!(stream.drain().is_empty());
    }

    #[test]
    fn test_severity() {
        assert_eq!(failed_upload().severity(), EventSeverity::Error);
        assert_eq!(
            CoreEvent::Documents(DocumentsEvent::DemoModeActivated {
                reason: "timeout".to_string()
            })
            .severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            CoreEvent::Upload(UploadEvent::Progress {
                entry_id: "e1".to_string(),
                percent: 40
            })
            .severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_serialization_is_tagged() {
        let json = serde_json::to_value(failed_upload()).unwrap();
        assert_eq!(json["type"], "Upload");
        assert_eq!(json["payload"]["event"], "Failed");
        assert_eq!(json["payload"]["message"], "HTTP 500");
    }
}
