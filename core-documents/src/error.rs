use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentsError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server responded with HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Request timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Unexpected response shape: {0}")]
    Validation(String),

    #[error("Not signed in: no credential available")]
    Unauthenticated,
}

impl DocumentsError {
    /// `true` for well-formed responses carrying an unexpected payload.
    pub fn is_validation(&self) -> bool {
        matches!(self, DocumentsError::Validation(_))
    }

    /// Whether retrying the same request could succeed.
    ///
    /// A missing credential is a precondition failure, not a transient one.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DocumentsError::Unauthenticated)
    }

    /// Value of the `error_kind` log field
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentsError::Transport(_) => "transport",
            DocumentsError::HttpStatus { .. } => "http_status",
            DocumentsError::Timeout { .. } => "timeout",
            DocumentsError::Validation(_) => "validation",
            DocumentsError::Unauthenticated => "unauthenticated",
        }
    }
}

impl From<BridgeError> for DocumentsError {
    fn from(error: BridgeError) -> Self {
        DocumentsError::Transport(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocumentsError>;
