use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use collabhub_core::actions::{ActionReceipt, ActionRequest};
use collabhub_core::activities::{ActionType, SubjectKind, SubjectRef};
use collabhub_core::errors::{Error as CoreError, ValidationError};
use collabhub_core::tasks::{Notification, NotificationType};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SubjectBody {
    kind: String,
    id: i64,
}

#[derive(Debug, Deserialize)]
struct NotifyBody {
    user_id: i64,
    title: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    notification_type: Option<NotificationType>,
}

/// Action reported by the CRUD layer. Enum-valued fields arrive as plain
/// strings so unknown values surface as validation errors.
#[derive(Debug, Deserialize)]
struct ActionBody {
    actor_id: i64,
    action_type: String,
    subject: SubjectBody,
    description: Option<String>,
    is_public: Option<bool>,
    notify: Option<NotifyBody>,
}

impl TryFrom<ActionBody> for ActionRequest {
    type Error = ValidationError;

    fn try_from(body: ActionBody) -> Result<Self, Self::Error> {
        let action_type: ActionType = body.action_type.parse()?;
        let kind: SubjectKind = body.subject.kind.parse()?;
        let notify = body.notify.map(|n| {
            Notification::new(n.user_id, n.title, n.message)
                .with_type(n.notification_type.unwrap_or_default())
        });
        Ok(ActionRequest {
            actor_id: body.actor_id,
            action_type,
            subject: SubjectRef::new(kind, body.subject.id),
            description: body.description.unwrap_or_default(),
            is_public: body.is_public.unwrap_or(true),
            notify,
        })
    }
}

async fn record_action(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActionBody>,
) -> ApiResult<(StatusCode, Json<ActionReceipt>)> {
    let request = ActionRequest::try_from(body).map_err(CoreError::from)?;
    let receipt = state.action_dispatcher.record(request).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/actions", post(record_action))
}
