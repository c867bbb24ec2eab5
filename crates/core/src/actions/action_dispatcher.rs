use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::activities::{ActionType, NewActivityEvent, SubjectRef};
use crate::errors::{Result, ValidationError};
use crate::recommendations::RecommendationServiceTrait;
use crate::tasks::{Notification, TaskQueue};

/// A domain action performed by a user, with an optional notification for
/// another user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub actor_id: i64,
    pub action_type: ActionType,
    pub subject: SubjectRef,
    pub description: String,
    pub is_public: bool,
    pub notify: Option<Notification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReceipt {
    pub activity_queued: bool,
    pub notification_queued: bool,
}

/// Turns a domain action into queued side effects.
///
/// Interest signals (save, follow, apply) drop the actor's cached
/// recommendations before returning, so the next read already excludes the
/// entity even while the log task is still queued.
pub struct ActionDispatcher {
    queue: Arc<TaskQueue>,
    recommendations: Arc<dyn RecommendationServiceTrait>,
}

impl ActionDispatcher {
    pub fn new(
        queue: Arc<TaskQueue>,
        recommendations: Arc<dyn RecommendationServiceTrait>,
    ) -> Self {
        Self {
            queue,
            recommendations,
        }
    }

    pub async fn record(&self, request: ActionRequest) -> Result<ActionReceipt> {
        let new_event = NewActivityEvent::new(
            request.actor_id,
            request.action_type,
            request.subject,
            request.description,
            request.is_public,
        );
        new_event.validate()?;
        if let Some(notification) = &request.notify {
            validate_notification(notification)?;
        }

        if request.action_type.is_interest_signal() {
            self.recommendations.invalidate(request.actor_id).await;
        }

        self.queue.enqueue_activity(new_event)?;
        let notification_queued = match request.notify {
            Some(notification) => {
                self.queue.enqueue_notification(notification)?;
                true
            }
            None => false,
        };

        debug!(
            "Queued {} by user {} on {}",
            request.action_type, request.actor_id, request.subject
        );
        Ok(ActionReceipt {
            activity_queued: true,
            notification_queued,
        })
    }
}

fn validate_notification(notification: &Notification) -> Result<()> {
    if notification.user_id <= 0 {
        return Err(ValidationError::InvalidInput(format!(
            "notification user_id must be positive, got {}",
            notification.user_id
        ))
        .into());
    }
    if notification.title.trim().is_empty() {
        return Err(ValidationError::MissingField("notify.title".to_string()).into());
    }
    Ok(())
}
