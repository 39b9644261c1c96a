//! # Dashboard Configuration Module
//!
//! Provides configuration management for the fiscal dashboard core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `DashboardConfig` holding the host bridges and the tuning knobs of the
//! document list controller and the upload pipeline. Validation is fail-fast:
//! `build()` refuses a configuration the core could not run with.
//!
//! ## Bridges
//!
//! - `HttpClient` - backend transport (desktop default: reqwest). Not required in demo mode.
//! - `CredentialProvider` - optional; when absent requests carry no credential.
//! - `Notifier` - toast sink (desktop default: tracing, otherwise a no-op).
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{DashboardConfig, SyncSettings};
//! use std::time::Duration;
//!
//! let config = DashboardConfig::builder()
//!     .api_base_url("https://fiscal.example.com/api")
//!     .sync(SyncSettings::default().with_debounce(Duration::from_millis(250)))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```
//! use core_runtime::config::DashboardConfig;
//!
//! let err = DashboardConfig::builder()
//!     .api_base_url("ftp://fiscal.example.com")
//!     .demo_mode(true)
//!     .build()
//!     .unwrap_err();
//! assert!(err.to_string().contains("http"));
//! ```

use crate::error::{Error, Result};
use bridge_traits::{CredentialProvider, HttpClient, Notifier};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound accepted for the debounce delay.
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(5);

/// Largest page size the backend accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Document sync settings
// ============================================================================

/// Timing and paging knobs of the document list controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Quiet period before a scheduled fetch runs
    pub debounce: Duration,
    /// Delay between a successful non-empty response and its commit.
    /// `Duration::ZERO` commits immediately.
    pub settle_delay: Duration,
    /// Hard deadline for a single list request
    pub fetch_timeout: Duration,
    /// Page size used when a query does not specify one
    pub default_page_size: u32,
    /// Show the demo data set when a fetch fails before anything was displayed
    pub demo_fallback: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            settle_delay: Duration::from_millis(100),
            fetch_timeout: Duration::from_secs(5),
            default_page_size: 10,
            demo_fallback: true,
        }
    }
}

impl SyncSettings {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce > MAX_DEBOUNCE {
            return Err(Error::Config(format!(
                "Debounce of {}ms exceeds maximum of {}ms",
                self.debounce.as_millis(),
                MAX_DEBOUNCE.as_millis()
            )));
        }

        if self.fetch_timeout.is_zero() {
            return Err(Error::Config(
                "Fetch timeout must be greater than 0ms".to_string(),
            ));
        }

        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Default page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Upload settings
// ============================================================================

/// Content types accepted by the backend by default.
pub const DEFAULT_ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/xml",
    "text/xml",
];

/// Extensions used when the host cannot tell the content type.
pub const DEFAULT_ACCEPTED_EXTENSIONS: &[&str] =
    &["pdf", "jpg", "jpeg", "png", "docx", "doc", "xml"];

/// Validation and progress knobs of the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    /// MIME allow-list, compared case-insensitively without parameters
    pub accepted_content_types: Vec<String>,
    /// Extension allow-list for files reported as empty or `application/octet-stream`
    pub accepted_extensions: Vec<String>,
    pub max_file_size_bytes: u64,
    /// Interval between simulated progress steps
    pub progress_tick: Duration,
    pub progress_step: u8,
    /// Simulated progress never exceeds this value before the transfer resolves
    pub progress_cap: u8,
    pub upload_timeout: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            accepted_content_types: DEFAULT_ACCEPTED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            accepted_extensions: DEFAULT_ACCEPTED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size_bytes: 10 * 1024 * 1024,
            progress_tick: Duration::from_millis(200),
            progress_step: 10,
            progress_cap: 90,
            upload_timeout: Duration::from_secs(120),
        }
    }
}

impl UploadSettings {
    pub fn with_accepted_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn with_progress(mut self, tick: Duration, step: u8, cap: u8) -> Self {
        self.progress_tick = tick;
        self.progress_step = step;
        self.progress_cap = cap;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.accepted_content_types.is_empty() {
            return Err(Error::Config(
                "At least one accepted content type is required".to_string(),
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(Error::Config(
                "Maximum file size must be greater than 0 bytes".to_string(),
            ));
        }

        if self.progress_cap >= 100 {
            return Err(Error::Config(
                "Progress cap must stay below 100 until the transfer resolves".to_string(),
            ));
        }

        if self.progress_step == 0 || self.progress_tick.is_zero() {
            return Err(Error::Config(
                "Progress step and tick must be greater than 0".to_string(),
            ));
        }

        if self.upload_timeout.is_zero() {
            return Err(Error::Config(
                "Upload timeout must be greater than 0ms".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// DashboardConfig
// ============================================================================

/// Configuration for the fiscal dashboard core.
///
/// Use [`DashboardConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct DashboardConfig {
    /// Base URL of the documents API, without trailing slash
    pub api_base_url: String,

    /// HTTP transport. `None` only in demo mode.
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Credential source attached to every request
    pub credentials: Option<Arc<dyn CredentialProvider>>,

    /// Toast sink
    pub notifier: Arc<dyn Notifier>,

    /// Serve everything from the in-memory demo data set
    pub demo_mode: bool,

    pub sync: SyncSettings,

    pub upload: UploadSettings,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "credentials",
                &self
                    .credentials
                    .as_ref()
                    .map(|_| "CredentialProvider { ... }"),
            )
            .field("notifier", &"Notifier { ... }")
            .field("demo_mode", &self.demo_mode)
            .field("sync", &self.sync)
            .field("upload", &self.upload)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl DashboardConfig {
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL is an http(s) URL
    /// - An HTTP client is present unless running in demo mode
    /// - Sync and upload settings are within bounds
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(format!(
                "API base URL must start with http:// or https:// (got '{}')",
                url
            )));
        }

        if self.http_client.is_none() && !self.demo_mode {
            return Err(http_client_missing_error());
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.sync.validate()?;
        self.upload.validate()?;

        Ok(())
    }

    /// The HTTP client, or a `CapabilityMissing` error when none was configured.
    pub fn require_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        self.http_client
            .clone()
            .ok_or_else(http_client_missing_error)
    }
}

fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "An HttpClient implementation is required to reach the documents API. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Otherwise inject a host transport, or enable demo mode to run without a backend."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

#[cfg(feature = "desktop-shims")]
fn provide_default_notifier() -> Arc<dyn Notifier> {
    Arc::new(bridge_desktop::TracingNotifier)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_notifier() -> Arc<dyn Notifier> {
    Arc::new(bridge_traits::NoopNotifier)
}

/// Builder for [`DashboardConfig`].
pub struct DashboardConfigBuilder {
    api_base_url: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    notifier: Option<Arc<dyn Notifier>>,
    demo_mode: bool,
    sync: SyncSettings,
    upload: UploadSettings,
    event_buffer_size: usize,
}

impl Default for DashboardConfigBuilder {
    fn default() -> Self {
        Self {
            api_base_url: None,
            http_client: None,
            credentials: None,
            notifier: None,
            demo_mode: false,
            sync: SyncSettings::default(),
            upload: UploadSettings::default(),
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl DashboardConfigBuilder {
    /// Sets the documents API base URL, e.g. `https://fiscal.example.com/api`.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn demo_mode(mut self, enabled: bool) -> Self {
        self.demo_mode = enabled;
        self
    }

    pub fn sync(mut self, settings: SyncSettings) -> Self {
        self.sync = settings;
        self
    }

    pub fn upload(mut self, settings: UploadSettings) -> Self {
        self.upload = settings;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// Missing bridges are filled with platform defaults when the
    /// `desktop-shims` feature is enabled. In demo mode no default transport
    /// is created.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the base URL is missing or a setting is out of range
    /// - [`Error::CapabilityMissing`] if no HTTP client is available outside demo mode
    pub fn build(self) -> Result<DashboardConfig> {
        let api_base_url = self
            .api_base_url
            .ok_or_else(|| Error::Config("API base URL is required".to_string()))?
            .trim()
            .trim_end_matches('/')
            .to_string();

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None if self.demo_mode => None,
            None => provide_default_http_client()?,
        };

        let notifier = self.notifier.unwrap_or_else(provide_default_notifier);

        let config = DashboardConfig {
            api_base_url,
            http_client,
            credentials: self.credentials,
            notifier,
            demo_mode: self.demo_mode,
            sync: self.sync,
            upload: self.upload,
            event_buffer_size: self.event_buffer_size,
        };

        config.validate()?;
        Ok(config)
    }
}
