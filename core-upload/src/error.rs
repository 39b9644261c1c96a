use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("{file_name}: unsupported file type '{content_type}'")]
    InvalidFileType {
        file_name: String,
        content_type: String,
    },

    #[error("{file_name}: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },

    #[error("{file_name}: upload failed: {message}")]
    Transfer { file_name: String, message: String },

    #[error("Upload entry {0} not found")]
    EntryNotFound(String),

    #[error("Invalid upload state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl UploadError {
    /// Rejected locally before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::InvalidFileType { .. } | UploadError::FileTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
