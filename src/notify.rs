//! Notification seam.
//!
//! Delivery (websockets, mail, whatever the deployment wires up) lives
//! outside this crate; the core only emits. Emission is best-effort with no
//! delivery guarantee, so implementations must not block or fail loudly.

use serde_json::Value;
use std::sync::Mutex;
use tracing::info;

/// Event emitted when the warning job flags an at-risk task.
pub const EVENT_TASK_WARNING: &str = "task.warning";
/// Event emitted when the recycle job resets a periodic task.
pub const EVENT_TASK_RECYCLED: &str = "task.recycled";

/// Best-effort sink for user-targeted events.
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: i64, event: &str, payload: Value);
}

/// Emits notifications as structured log lines. The default sink in `serve`,
/// where no delivery channel is attached.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, user_id: i64, event: &str, payload: Value) {
        info!(user_id, event, payload = %payload, "notification emitted");
    }
}

/// One recorded notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub user_id: i64,
    pub event: String,
    pub payload: Value,
}

/// Records notifications in memory for inspection. Used by tests and by
/// embedders that drain events themselves.
#[derive(Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all recorded notifications.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, user_id: i64, event: &str, payload: Value) {
        self.events.lock().unwrap().push(Notification {
            user_id,
            event: event.to_string(),
            payload,
        });
    }
}
