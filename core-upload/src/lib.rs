//! # Upload Pipeline
//!
//! Sequential document uploads with per-file progress and status.
//!
//! - [`FileValidator`]: MIME allow-list with an extension fallback and a size limit
//! - [`FileUploadEntry`]: one tracked file and its `pending → uploading → success | error` lifecycle
//! - [`ProgressSimulator`]: capped fake progress while the transfer is outstanding
//! - [`UploadPipeline`]: validation, strictly ordered transfers, notifications and
//!   the document refresh trigger

pub mod entry;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod validation;

pub use entry::{EntryId, FileUploadEntry, UploadStatus, MAX_IN_FLIGHT_PROGRESS};
pub use error::{Result, UploadError};
pub use pipeline::{RefreshTrigger, RejectedFile, UploadBatchReport, UploadPipeline};
pub use progress::{ProgressSimulator, ProgressTracker};
pub use validation::{normalize_content_type, FileValidator};
