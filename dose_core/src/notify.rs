//! Notification delivery collaborators.
//!
//! Delivery is fire-and-forget from the engine's perspective: a sink that
//! cannot deliver logs the failure and the engine proceeds as if delivery had
//! not been requested. Sinks are injected so tests can substitute a recording
//! fake.

use std::sync::Mutex;

/// Callback invoked exactly once when a blocking alert is acknowledged
pub type DismissFn = Box<dyn FnOnce() + Send>;

/// Notification collaborator contract
pub trait NotificationSink {
    /// Idempotent permission check; safe to call repeatedly
    fn request_permission(&self) -> bool;

    /// Fire-and-forget delivery of a short notification
    fn deliver(&self, title: &str, body: &str);

    /// Louder in-app alarm path; `on_dismiss` runs exactly once when the
    /// user acknowledges
    fn present_blocking_alert(&self, message: &str, on_dismiss: DismissFn);
}

/// Sink that writes notifications to the tracing log.
///
/// Useful as a default where no interactive surface exists; the alert path
/// acknowledges immediately since there is nobody to block on.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn request_permission(&self) -> bool {
        true
    }

    fn deliver(&self, title: &str, body: &str) {
        tracing::info!("notification: {} - {}", title, body);
    }

    fn present_blocking_alert(&self, message: &str, on_dismiss: DismissFn) {
        tracing::warn!("alarm: {}", message);
        on_dismiss();
    }
}

/// Recording fake for tests
#[derive(Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<(String, String)>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn request_permission(&self) -> bool {
        true
    }

    fn deliver(&self, title: &str, body: &str) {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((title.to_string(), body.to_string()));
    }

    fn present_blocking_alert(&self, message: &str, on_dismiss: DismissFn) {
        self.alerts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
        on_dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_recording_notifier_captures_deliveries() {
        let notifier = RecordingNotifier::new();
        notifier.deliver("Time for Refresh", "Take 1 drop(s) now");

        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "Time for Refresh");
    }

    #[test]
    fn test_alert_dismiss_runs_exactly_once() {
        let notifier = RecordingNotifier::new();
        let dismissals = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&dismissals);
        notifier.present_blocking_alert(
            "Take 2 drop(s) of Refresh now",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(dismissals.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[test]
    fn test_permission_is_idempotent() {
        let notifier = LogNotifier;
        assert!(notifier.request_permission());
        assert!(notifier.request_permission());
    }
}
