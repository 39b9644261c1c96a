//! Notification Abstraction
//!
//! The core never renders UI. It emits toast-style notification requests
//! (title + description) and the host decides how to display them.

use serde::{Deserialize, Serialize};

/// Visual flavour of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A human-readable notification request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Toast/notification sink implemented by the host
///
/// Must not block: implementations should enqueue and return.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that drops everything. Useful for headless hosts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(
            Notification::success("Uploaded", "a.pdf").kind,
            NotificationKind::Success
        );
        assert_eq!(Notification::error("Failed", "x").kind, NotificationKind::Error);
        assert_eq!(Notification::info("Demo", "y").kind, NotificationKind::Info);
    }

    #[test]
    fn test_serializes_lowercase_kind() {
        let json = serde_json::to_string(&Notification::info("Demo mode", "offline")).unwrap();
        assert!(json.contains("\"kind\":\"info\""));
    }
}
