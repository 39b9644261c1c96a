//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service` and, through it, `core-documents` and
//! `core-upload`). Host applications can depend on `fiscal-dashboard` and enable
//! the documented features without wiring each crate individually.
//!
//! - `desktop-shims` (default): reqwest-backed HTTP client and tracing notifier.
//! - `demo`: façade only; pair with `DashboardConfig::demo_mode` to run without a backend.

#[cfg(any(feature = "desktop-shims", feature = "demo"))]
pub use core_service::*;
