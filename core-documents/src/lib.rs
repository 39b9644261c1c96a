//! # Document List Module
//!
//! Keeps the dashboard's paginated, filtered document list in sync with the
//! backend.
//!
//! ## Overview
//!
//! This module provides:
//! - The document data model and list response parsing ([`models`])
//! - The [`DocumentsApi`] seam with REST and in-memory implementations
//! - The pure [`derive_ui_state`] function behind the flicker-free UI states
//! - [`DocumentSyncController`]: debounced, cancelable fetches where only the
//!   latest issued request can ever write state

pub mod api;
pub mod controller;
pub mod demo;
pub mod error;
pub mod models;
pub mod ui_state;

pub use api::{DocumentsApi, HttpDocumentsApi, ProgressSink, UploadFile};
pub use controller::{DataSource, DocumentListSnapshot, DocumentSyncController};
pub use demo::{DemoDocuments, DemoDocumentsApi};
pub use error::{DocumentsError, Result};
pub use models::{
    Document, DocumentListResponse, DocumentStatus, FilterState, ListQuery, PaginationInfo,
};
pub use ui_state::{derive_ui_state, UiState};
