//! Core service façade and bootstrap.
//!
//! [`DashboardCore`] turns a validated [`DashboardConfig`] into a running
//! document list controller and upload pipeline that share one event bus.
//! Every finished upload asks the controller to reload the current page, so
//! new documents show up without the host wiring anything.
//!
//! Desktop hosts enable the `desktop-shims` feature (the default), which
//! supplies the reqwest transport and the tracing notifier. Hosts without a
//! backend set `demo_mode` and run against the in-memory sample documents.

pub mod error;

pub use error::{CoreError, Result};

pub use core_documents::{
    DataSource, Document, DocumentListSnapshot, DocumentStatus, DocumentSyncController,
    FilterState, ListQuery, PaginationInfo, UiState, UploadFile,
};
pub use core_runtime::config::{DashboardConfig, SyncSettings, UploadSettings};
pub use core_runtime::events::{CoreEvent, DocumentsEvent, EventBus, EventStream, UploadEvent};
pub use core_upload::{
    EntryId, FileUploadEntry, UploadBatchReport, UploadPipeline, UploadStatus,
};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{
    EnvCredentialProvider, ReqwestHttpClient, StaticCredentialProvider, TracingNotifier,
};

use std::sync::Arc;

use core_documents::{DemoDocumentsApi, DocumentsApi, HttpDocumentsApi};
use core_upload::RefreshTrigger;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
///
/// ```ignore
/// let config = DashboardConfig::builder()
///     .api_base_url("https://api.example.com")
///     .credentials(Arc::new(StaticCredentialProvider::bearer(token)))
///     .build()?;
/// let core = DashboardCore::bootstrap(config)?;
///
/// core.documents().request_load(ListQuery::new(1, 10));
/// let report = core.uploads().add_files(selected).await;
/// ```
pub struct DashboardCore {
    demo_mode: bool,
    events: EventBus,
    documents: Arc<DocumentSyncController>,
    uploads: UploadPipeline,
}

impl DashboardCore {
    /// Build the API client, event bus, controller and pipeline.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] if the configuration is invalid or no HTTP client
    /// is available outside demo mode.
    #[instrument(skip(config), fields(demo_mode = config.demo_mode))]
    pub fn bootstrap(config: DashboardConfig) -> Result<Self> {
        config.validate()?;

        let api: Arc<dyn DocumentsApi> = if config.demo_mode {
            Arc::new(DemoDocumentsApi::new())
        } else {
            Arc::new(HttpDocumentsApi::new(
                config.require_http_client()?,
                config.api_base_url.clone(),
                config.credentials.clone(),
            ))
        };

        let events = EventBus::new(config.event_buffer_size);

        let documents = Arc::new(
            DocumentSyncController::new(api.clone(), config.sync.clone(), config.notifier.clone())
                .with_events(events.clone()),
        );

        let uploads = UploadPipeline::new(api, config.upload.clone(), config.notifier.clone())
            .with_events(events.clone())
            .with_refresh_trigger(refresh_trigger(&documents));

        info!(
            api_base_url = %config.api_base_url,
            demo_mode = config.demo_mode,
            "Dashboard core ready"
        );

        Ok(Self {
            demo_mode: config.demo_mode,
            events,
            documents,
            uploads,
        })
    }

    pub fn documents(&self) -> &DocumentSyncController {
        &self.documents
    }

    pub fn uploads(&self) -> &UploadPipeline {
        &self.uploads
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Running against the in-memory sample documents.
    pub fn is_demo(&self) -> bool {
        self.demo_mode
    }

    /// Stop the controller; late fetch results are discarded.
    pub fn shutdown(&self) {
        info!("Shutting down dashboard core");
        self.documents.dispose();
    }
}

/// Reload the document list after each upload without keeping the
/// controller alive.
fn refresh_trigger(documents: &Arc<DocumentSyncController>) -> RefreshTrigger {
    let weak = Arc::downgrade(documents);
    Arc::new(move || {
        if let Some(documents) = weak.upgrade() {
            documents.reload();
        }
    })
}
