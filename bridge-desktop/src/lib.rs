//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for native hosts
//! (desktop shells, CLIs, integration environments).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (retry with backoff, multipart uploads)
//! - `CredentialProvider` backed by a static token/cookie or an environment variable
//! - `Notifier` that forwards toasts to `tracing`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, StaticCredentialProvider, TracingNotifier};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let credentials = StaticCredentialProvider::bearer("token");
//! let notifier = TracingNotifier::default();
//! // Use in DashboardConfig
//! ```

mod credentials;
mod http;
mod notifier;

pub use credentials::{EnvCredentialProvider, StaticCredentialProvider};
pub use http::ReqwestHttpClient;
pub use notifier::{MemoryNotifier, TracingNotifier};
