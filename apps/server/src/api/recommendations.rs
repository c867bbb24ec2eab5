use std::sync::Arc;

use crate::{auth::AuthUser, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use collabhub_core::constants::DEFAULT_RECOMMENDATION_LIMIT;
use collabhub_core::errors::Error as CoreError;
use collabhub_core::recommendations::{RecommendationItem, RecommendationKind, Recommendations};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct RecommendationDto {
    id: i64,
    name: String,
    score: f64,
    reason: String,
}

impl From<RecommendationItem> for RecommendationDto {
    fn from(item: RecommendationItem) -> Self {
        Self {
            id: item.entity.id(),
            name: item.name,
            score: item.score,
            reason: item.reason,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecommendationsResponse {
    #[serde(rename = "type")]
    kind: RecommendationKind,
    recommendations: Vec<RecommendationDto>,
}

impl From<Recommendations> for RecommendationsResponse {
    fn from(recs: Recommendations) -> Self {
        Self {
            kind: recs.kind,
            recommendations: recs.items.into_iter().map(Into::into).collect(),
        }
    }
}

async fn get_recommendations(
    AuthUser(user_id): AuthUser,
    Query(q): Query<RecommendationQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let kind = q
        .kind
        .as_deref()
        .filter(|k| !k.is_empty())
        .map(str::parse::<RecommendationKind>)
        .transpose()
        .map_err(CoreError::from)?;
    let recs = state
        .recommendation_service
        .get_recommendations(user_id, kind, q.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT))
        .await?;
    Ok(Json(recs.into()))
}

async fn invalidate_recommendations(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.recommendation_service.invalidate(user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", get(get_recommendations))
        .route("/recommendations/invalidate", post(invalidate_recommendations))
}
