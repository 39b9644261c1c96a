//! Documents API client
//!
//! [`DocumentsApi`] is the seam between the controller/pipeline and the
//! backend. [`HttpDocumentsApi`] talks to the REST service through the host
//! `HttpClient`; [`DemoDocumentsApi`](crate::demo::DemoDocumentsApi) serves the
//! same contract from memory.

use async_trait::async_trait;
use bridge_traits::auth::{Credential, CredentialProvider};
use bridge_traits::http::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RetryPolicy,
};
use bytes::Bytes;
use core_runtime::logging::strip_path;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{DocumentsError, Result};
use crate::models::{Document, DocumentListResponse, ListQuery};

/// Multipart field name expected by the upload endpoint.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Receives transfer progress in percent (0-100).
pub type ProgressSink = Arc<dyn Fn(u8) + Send + Sync>;

/// A file ready to be sent to the upload endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Backend operations used by the dashboard core.
#[async_trait]
pub trait DocumentsApi: Send + Sync {
    /// Fetch one page of documents.
    ///
    /// # Errors
    ///
    /// - [`DocumentsError::Validation`] for an unexpected payload shape
    /// - [`DocumentsError::Unauthenticated`] when no credential is available
    /// - transport variants otherwise
    async fn list(&self, query: &ListQuery) -> Result<DocumentListResponse>;

    /// Upload a single file and return the created document.
    ///
    /// `progress` is only passed when [`reports_progress`](Self::reports_progress)
    /// returns `true`.
    async fn upload(&self, file: &UploadFile, progress: Option<ProgressSink>) -> Result<Document>;

    /// Whether `upload` reports real byte-level progress.
    fn reports_progress(&self) -> bool {
        false
    }
}

/// REST implementation of [`DocumentsApi`]
///
/// - `GET {base}/documents?page=&limit=&status=&search=`
/// - `POST {base}/documents/upload` (multipart, field `file`)
pub struct HttpDocumentsApi {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl HttpDocumentsApi {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn list_url(&self, query: &ListQuery) -> String {
        format!("{}/documents?{}", self.base_url, query.to_query_string())
    }

    fn upload_url(&self) -> String {
        format!("{}/documents/upload", self.base_url)
    }

    /// Attach the current credential. Without a provider the request goes out
    /// as-is (cookie sessions handled by the transport).
    async fn authorize(&self, request: HttpRequest) -> Result<HttpRequest> {
        let Some(provider) = &self.credentials else {
            return Ok(request);
        };

        match provider.credential().await? {
            Some(Credential::Bearer(token)) => Ok(request.bearer_token(token)),
            Some(Credential::SessionCookie(cookie)) => Ok(request.cookie(cookie)),
            None => Err(DocumentsError::Unauthenticated),
        }
    }

    /// Map non-2xx responses onto the error taxonomy.
    fn check_status(response: &HttpResponse) -> Result<()> {
        if response.is_success() {
            return Ok(());
        }

        if response.status == 401 {
            return Err(DocumentsError::Unauthenticated);
        }

        Err(DocumentsError::HttpStatus {
            status: response.status,
            message: Self::error_detail(response),
        })
    }

    /// Best-effort human-readable message from an error body.
    fn error_detail(response: &HttpResponse) -> String {
        let from_json = serde_json::from_slice::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|value| {
                ["detail", "message", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            });

        match from_json {
            Some(message) => message,
            None => {
                let text = String::from_utf8_lossy(&response.body);
                let text = text.trim();
                if text.is_empty() {
                    format!("HTTP {}", response.status)
                } else {
                    text.chars().take(200).collect()
                }
            }
        }
    }

    fn parse_document(body: &[u8]) -> Result<Document> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| DocumentsError::Validation(format!("Body is not JSON: {}", e)))?;

        // Some deployments wrap the created document.
        let value = match value.get("document") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => value,
        };

        serde_json::from_value(value).map_err(|e| DocumentsError::Validation(e.to_string()))
    }
}

#[async_trait]
impl DocumentsApi for HttpDocumentsApi {
    #[instrument(skip(self), fields(page = query.page, limit = query.limit))]
    async fn list(&self, query: &ListQuery) -> Result<DocumentListResponse> {
        let request = HttpRequest::new(HttpMethod::Get, self.list_url(query))
            .header("Accept", "application/json");
        let request = self.authorize(request).await?;

        let response = self.http_client.execute(request).await?;
        Self::check_status(&response)?;

        let parsed = DocumentListResponse::from_slice(&response.body)?;
        debug!(
            count = parsed.documents.len(),
            total = parsed.pagination.total_documents,
            "Document page received"
        );
        Ok(parsed)
    }

    #[instrument(
        skip(self, file, _progress),
        fields(file = %strip_path(&file.file_name), size = file.data.len())
    )]
    async fn upload(&self, file: &UploadFile, _progress: Option<ProgressSink>) -> Result<Document> {
        let form = MultipartForm::new().file(
            UPLOAD_FIELD_NAME,
            file.file_name.clone(),
            file.content_type.clone(),
            file.data.clone(),
        );
        let request = HttpRequest::new(HttpMethod::Post, self.upload_url())
            .header("Accept", "application/json")
            .multipart(form);
        let request = self.authorize(request).await?;

        // Uploads are not idempotent.
        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::none())
            .await?;

        if let Err(error) = Self::check_status(&response) {
            warn!(status = response.status, error = %error, "Upload rejected by server");
            return Err(error);
        }

        Self::parse_document(&response.body)
    }
}
