//! Notifier implementations for native hosts

use bridge_traits::notification::{Notification, NotificationKind, Notifier};
use parking_lot::Mutex;
use tracing::{error, info};

/// Forwards toast requests to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => error!(
                target: "notification",
                title = %notification.title,
                "{}",
                notification.description
            ),
            NotificationKind::Success | NotificationKind::Info => info!(
                target: "notification",
                kind = ?notification.kind,
                title = %notification.title,
                "{}",
                notification.description
            ),
        }
    }
}

/// Records every notification in memory.
///
/// Handy for headless hosts that poll for toasts, and for tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far, oldest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// Notifications of one kind
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.received
            .lock()
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect()
    }

    /// Remove and return everything received so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notification::info("Demo mode", "Backend unreachable"));
        notifier.notify(Notification::error("Upload failed", "a.pdf"));

        let all = notifier.notifications();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Demo mode");
        assert_eq!(notifier.of_kind(NotificationKind::Error).len(), 1);

        assert_eq!(notifier.drain().len(), 2);
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn test_tracing_notifier_does_not_panic_without_subscriber() {
        TracingNotifier.notify(Notification::success("Uploaded", "invoice.pdf"));
    }
}
