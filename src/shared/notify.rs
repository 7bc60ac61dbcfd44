//! Notification collaborators.
//!
//! The task engine only ever calls these interfaces; displaying, stacking and
//! auto-dismissing toasts belongs to whoever implements them.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Default display time for in-app notifications.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// In-app notification sink (toasts).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity, duration: Duration);
}

/// OS-level notification sink, used best-effort for reminders.
pub trait DesktopNotifier: Send + Sync {
    fn permission_granted(&self) -> bool;
    fn show(&self, title: &str, body: &str);
}

/// Notifier that writes every toast to the `system` log target.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        match severity {
            Severity::Error => tracing::error!(
                target: "system",
                duration_ms = duration.as_millis() as u64,
                "{}",
                message
            ),
            Severity::Warning => tracing::warn!(
                target: "system",
                duration_ms = duration.as_millis() as u64,
                "{}",
                message
            ),
            Severity::Success | Severity::Info => tracing::info!(
                target: "system",
                severity = severity.as_str(),
                duration_ms = duration.as_millis() as u64,
                "{}",
                message
            ),
        }
    }
}

/// Desktop notifier for hosts without OS notification support.
/// Never reports permission, so nothing is ever shown.
#[derive(Debug, Default)]
pub struct NoDesktopNotifier;

impl DesktopNotifier for NoDesktopNotifier {
    fn permission_granted(&self) -> bool {
        false
    }

    fn show(&self, _title: &str, _body: &str) {}
}

/// A toast captured by [`QueuedNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

/// Notifier that queues toasts until a presentation layer drains them.
#[derive(Debug, Default)]
pub struct QueuedNotifier {
    queue: Mutex<Vec<Toast>>,
}

impl QueuedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *queue)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.push(Toast {
            message: message.to_string(),
            severity,
            duration,
        });
    }
}
