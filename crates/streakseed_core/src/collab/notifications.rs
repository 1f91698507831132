//! System notification boundary.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Opaque handle for one scheduled notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderHandle(pub u64);

/// Platform notification adapters implement this trait.
///
/// Delivery is subject to OS permission and outside core control.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, request: NotificationRequest) -> ReminderHandle;
    fn cancel(&self, handle: ReminderHandle);
}

/// Sink that only records schedule/cancel calls in the log.
#[derive(Debug, Default)]
pub struct LogNotificationSink {
    next_handle: AtomicU64,
}

impl NotificationSink for LogNotificationSink {
    fn schedule(&self, request: NotificationRequest) -> ReminderHandle {
        let handle = ReminderHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        info!(
            "event=reminder_schedule module=notifications status=ok handle={} at={}",
            handle.0,
            request.scheduled_for.to_rfc3339()
        );
        handle
    }

    fn cancel(&self, handle: ReminderHandle) {
        info!(
            "event=reminder_cancel module=notifications status=ok handle={}",
            handle.0
        );
    }
}
