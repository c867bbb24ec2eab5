use async_trait::async_trait;
use log::info;

use super::tasks_model::Notification;
use crate::activities::ActivityEvent;
use crate::errors::Result;

/// Outbound channel for user notifications (push, email, webhook).
///
/// Called only from the task worker, never on a request path.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Sink that only writes notifications to the log.
#[derive(Clone, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            "Notification for user {}: {} ({:?})",
            notification.user_id, notification.title, notification.notification_type
        );
        Ok(())
    }
}

/// Hook invoked by the task worker after an activity event is persisted.
///
/// Implementations must be best-effort: they log their own failures and
/// never fail the task that triggered them.
#[async_trait]
pub trait ActivityObserver: Send + Sync {
    async fn on_activity_logged(&self, event: &ActivityEvent);
}
