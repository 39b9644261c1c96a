//! Domain models for the document list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DocumentsError, Result};

/// Server-side processing lifecycle of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Processed,
    Error,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 4] = [
        DocumentStatus::Pending,
        DocumentStatus::Processing,
        DocumentStatus::Processed,
        DocumentStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Processed => "processed",
            DocumentStatus::Error => "error",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = DocumentsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DocumentStatus::Pending),
            "processing" => Ok(DocumentStatus::Processing),
            "processed" => Ok(DocumentStatus::Processed),
            "error" => Ok(DocumentStatus::Error),
            other => Err(DocumentsError::Validation(format!(
                "Unknown document status '{}'",
                other
            ))),
        }
    }
}

/// A stored document as returned by the API.
///
/// Only `status`, `processed_at` and `processing_result` ever change, and
/// only server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_size: u64,
    #[serde(alias = "content_type")]
    pub mime_type: String,
    pub status: DocumentStatus,
    #[serde(with = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub processed_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    #[serde(default)]
    pub processing_result: Option<serde_json::Value>,
}

/// Pagination block of a list response.
///
/// The derived fields are recomputed locally from `current_page`,
/// `total_pages` and `total_documents` so they never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_documents: u64,
    pub limit: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub previous_page: Option<u32>,
}

impl PaginationInfo {
    pub fn new(current_page: u32, limit: u32, total_documents: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total_documents.div_ceil(u64::from(limit)) as u32;
        Self {
            current_page: current_page.max(1),
            total_pages,
            total_documents,
            limit,
            has_next: false,
            has_previous: false,
            next_page: None,
            previous_page: None,
        }
        .normalized()
    }

    /// Recompute the derived navigation fields.
    pub fn normalized(mut self) -> Self {
        self.current_page = self.current_page.max(1);
        self.has_next = self.current_page < self.total_pages;
        self.has_previous = self.current_page > 1;
        self.next_page = self.has_next.then_some(self.current_page + 1);
        self.previous_page = self.has_previous.then_some(self.current_page - 1);
        self
    }

    /// Pagination shown before anything was fetched.
    pub fn empty(limit: u32) -> Self {
        Self::new(1, limit, 0)
    }
}

/// Status/search filter owned by the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

impl FilterState {
    pub fn new(status: Option<DocumentStatus>, search: Option<String>) -> Self {
        Self { status, search }.normalized()
    }

    /// Blank search strings mean "no search".
    pub fn normalized(mut self) -> Self {
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.search.is_none()
    }
}

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: FilterState,
}

impl ListQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            filters: FilterState::default(),
        }
    }

    pub fn with_status(mut self, status: Option<DocumentStatus>) -> Self {
        self.filters.status = status;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.filters.search = Some(search.into());
        self.filters = self.filters.normalized();
        self
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters.normalized();
        self
    }

    /// Query-string encoding, e.g. `page=2&limit=10&status=pending&search=nota%20fiscal`
    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![
            format!("page={}", self.page),
            format!("limit={}", self.limit),
        ];
        if let Some(status) = self.filters.status {
            pairs.push(format!("status={}", status.as_str()));
        }
        if let Some(search) = &self.filters.search {
            pairs.push(format!("search={}", urlencoding::encode(search)));
        }
        pairs.join("&")
    }
}

/// Body of `GET /documents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
    pub pagination: PaginationInfo,
    #[serde(default)]
    pub filters: FilterState,
}

impl DocumentListResponse {
    /// Parse and shape-check a list response body.
    ///
    /// # Errors
    ///
    /// [`DocumentsError::Validation`] when the body is not JSON, when
    /// `documents` is missing or not an array, or when `pagination` is missing
    /// or does not decode.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| DocumentsError::Validation(format!("Body is not JSON: {}", e)))?;

        match value.get("documents") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => {
                return Err(DocumentsError::Validation(
                    "`documents` is not an array".to_string(),
                ))
            }
            None => {
                return Err(DocumentsError::Validation(
                    "`documents` field is missing".to_string(),
                ))
            }
        }

        if !value.get("pagination").is_some_and(|p| p.is_object()) {
            return Err(DocumentsError::Validation(
                "`pagination` block is missing".to_string(),
            ));
        }

        let mut response: DocumentListResponse = serde_json::from_value(value)
            .map_err(|e| DocumentsError::Validation(e.to_string()))?;
        response.pagination = response.pagination.normalized();
        response.filters = response.filters.normalized();
        Ok(response)
    }
}

/// Timestamps arrive either as RFC 3339 or as naive ISO 8601 in UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}
