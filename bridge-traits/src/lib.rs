//! # Host Bridge Traits
//!
//! Capability contracts that the host application implements for the
//! dashboard core.
//!
//! ## Overview
//!
//! The core is an in-memory orchestration layer over a REST backend. It does
//! not own a transport, a session, or a UI. Each trait below is one of those
//! collaborators, injected by the host (see `bridge-desktop` for the native
//! defaults).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP with JSON and multipart bodies
//! - [`CredentialProvider`](auth::CredentialProvider) - Bearer token or session cookie
//! - [`Notifier`](notification::Notifier) - Toast requests (title + description)
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! async tasks behind `Arc`.

pub mod auth;
pub mod error;
pub mod http;
pub mod notification;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use auth::{Credential, CredentialProvider};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RetryPolicy};
pub use notification::{NoopNotifier, Notification, NotificationKind, Notifier};
pub use time::{Clock, FixedClock, SystemClock};
