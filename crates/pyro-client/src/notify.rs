//! Error notifications ("toasts").
//!
//! Every failed call reports to the client's [`Notifier`] with the server's
//! message or the generic fallback, unless the call was made with
//! [`RequestOptions::skip_notification`]. Validation and upload errors are
//! handled where they happen and never reach the notifier.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Error,
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Logs toasts; the default sink for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error | ToastLevel::Warning => {
                tracing::warn!(level = ?toast.level, "{}", toast.message)
            }
            ToastLevel::Success | ToastLevel::Info => tracing::info!("{}", toast.message),
        }
    }
}

/// Keeps every toast in memory, for tests and for UIs that drain a queue.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock())
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Suppress the error toast (polling and non-critical reads).
    pub skip_notification: bool,
}

impl RequestOptions {
    pub fn silent() -> Self {
        Self {
            skip_notification: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_notifier_drains() {
        let sink = CollectingNotifier::new();
        sink.notify(Toast::error("Network Error!"));
        sink.notify(Toast::success("Saved"));
        assert_eq!(sink.toasts().len(), 2);
        let drained = sink.drain();
        assert_eq!(drained[0].level, ToastLevel::Error);
        assert!(sink.toasts().is_empty());
    }
}
