use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::activities::NewActivityEvent;

/// Category shown alongside a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// A message addressed to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub notification_type: NotificationType,
}

impl Notification {
    pub fn new(user_id: i64, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            notification_type: NotificationType::default(),
        }
    }

    pub fn with_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = notification_type;
        self
    }
}

/// Work carried by a queued task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum TaskPayload {
    LogActivity(NewActivityEvent),
    Notify(Notification),
}

impl TaskPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskPayload::LogActivity(_) => "log_activity",
            TaskPayload::Notify(_) => "notify",
        }
    }

    /// Key under which duplicate payloads collapse.
    pub fn dedup_key(&self) -> String {
        match self {
            TaskPayload::LogActivity(event) => activity_dedup_key(event),
            TaskPayload::Notify(notification) => {
                notification_dedup_key(notification.user_id, &notification.title)
            }
        }
    }
}

/// A task waiting in the queue.
#[derive(Debug, Clone)]
pub struct Task {
    pub dedup_key: String,
    pub enqueued_at: Instant,
    pub payload: TaskPayload,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.payload.kind(), self.dedup_key)
    }
}

/// Dedup key for an activity log task: the same actor performing the same
/// action on the same subject.
pub fn activity_dedup_key(event: &NewActivityEvent) -> String {
    format!(
        "activity:{}:{}:{}:{}",
        event.actor_id,
        event.action_type,
        event.subject.kind(),
        event.subject.id()
    )
}

/// Dedup key for a notification: the same recipient and title. The title is
/// hashed so arbitrary user text never ends up in a key.
pub fn notification_dedup_key(user_id: i64, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.trim().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("notify:{}:{}", user_id, &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::{ActionType, SubjectRef};

    #[test]
    fn test_activity_dedup_key_is_stable() {
        let event = NewActivityEvent::new(
            7,
            ActionType::StartupSaved,
            SubjectRef::Startup(42),
            "Saved Acme",
            true,
        );
        assert_eq!(activity_dedup_key(&event), "activity:7:startup_saved:startup:42");

        // description is not part of the identity
        let mut other = event.clone();
        other.description = "different".to_string();
        assert_eq!(activity_dedup_key(&event), activity_dedup_key(&other));
    }

    #[test]
    fn test_notification_dedup_key_ignores_message() {
        let a = TaskPayload::Notify(Notification::new(3, "New follower", "Alice followed you"));
        let b = TaskPayload::Notify(Notification::new(3, "New follower", "Bob followed you"));
        let c = TaskPayload::Notify(Notification::new(4, "New follower", "Alice followed you"));

        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), c.dedup_key());
        assert!(a.dedup_key().starts_with("notify:3:"));
    }

    #[test]
    fn test_payload_serializes_with_kind_tag() {
        let payload = TaskPayload::Notify(Notification::new(1, "t", "m"));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "notify");
        assert_eq!(json["payload"]["notificationType"], "info");
    }
}
