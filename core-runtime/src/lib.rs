//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the fiscal dashboard core:
//! - Logging and tracing bootstrap
//! - Configuration management (`DashboardConfig`, sync and upload settings)
//! - Event bus system
//!
//! ## Overview
//!
//! The domain crates (`core-documents`, `core-upload`) read their tuning
//! knobs from [`config`] and publish what they do on the [`events::EventBus`].
//! Hosts subscribe to the bus for diagnostics and drive rendering from the
//! snapshots exposed by the domain crates.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
