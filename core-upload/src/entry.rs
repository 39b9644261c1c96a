//! # Upload Entry State Machine
//!
//! One [`FileUploadEntry`] per accepted file, mutated in place through its
//! lifecycle and never reused. Retrying a failed file creates a new entry.
//!
//! ```text
//! Pending → Uploading → Success
//!              ↓
//!            Error
//! ```
//!
//! Progress only moves forward while uploading and stays below 100 until the
//! transfer resolves.

use core_documents::UploadFile;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, UploadError};

/// Highest progress shown before the transfer has resolved.
pub const MAX_IN_FLIGHT_PROGRESS: u8 = 99;

/// Unique identifier for an upload entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadEntry {
    pub id: EntryId,
    pub file: UploadFile,
    /// 0-100
    pub progress: u8,
    pub status: UploadStatus,
    pub error: Option<String>,
    /// Id of the created document once the upload succeeded
    pub document_id: Option<i64>,
}

impl FileUploadEntry {
    pub fn new(file: UploadFile) -> Self {
        Self {
            id: EntryId::new(),
            file,
            progress: 0,
            status: UploadStatus::Pending,
            error: None,
            document_id: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file.file_name
    }

    fn transition(&mut self, to: UploadStatus) -> Result<()> {
        let allowed = matches!(
            (self.status, to),
            (UploadStatus::Pending, UploadStatus::Uploading)
                | (UploadStatus::Uploading, UploadStatus::Success)
                | (UploadStatus::Uploading, UploadStatus::Error)
        );

        if !allowed {
            return Err(UploadError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        self.status = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(UploadStatus::Uploading)?;
        self.progress = 0;
        self.error = None;
        Ok(())
    }

    /// Raise progress while uploading. Returns `true` when the value changed.
    ///
    /// Values never go down and are clamped below 100.
    pub fn advance_progress(&mut self, percent: u8) -> bool {
        if self.status != UploadStatus::Uploading {
            return false;
        }

        let percent = percent.min(MAX_IN_FLIGHT_PROGRESS);
        if percent <= self.progress {
            return false;
        }

        self.progress = percent;
        true
    }

    pub fn complete(&mut self, document_id: i64) -> Result<()> {
        self.transition(UploadStatus::Success)?;
        self.progress = 100;
        self.document_id = Some(document_id);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(UploadStatus::Error)?;
        self.progress = 0;
        self.error = Some(message.into());
        Ok(())
    }
}
