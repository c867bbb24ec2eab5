use std::sync::Arc;

use crate::{auth::AuthUser, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use collabhub_core::activities::ActionType;
use collabhub_core::constants::DEFAULT_FEED_PAGE_SIZE;
use collabhub_core::errors::Error as CoreError;
use collabhub_core::feeds::{FeedPage, FeedRequest, FeedState};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FeedQuery {
    page: Option<usize>,
    page_size: Option<usize>,
    #[serde(rename = "type")]
    action_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
    page_size: Option<usize>,
}

async fn get_feed(
    AuthUser(user_id): AuthUser,
    Query(q): Query<FeedQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FeedPage>> {
    let action_type = q
        .action_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::parse::<ActionType>)
        .transpose()
        .map_err(CoreError::from)?;
    let request = FeedRequest {
        page: q.page.unwrap_or(1),
        page_size: q.page_size.unwrap_or(DEFAULT_FEED_PAGE_SIZE),
        action_type,
    };
    let page = state.feed_service.get_feed(user_id, request).await?;
    Ok(Json(page))
}

async fn get_feed_state(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Option<FeedState>>> {
    Ok(Json(state.feed_service.get_feed_state(user_id)?))
}

async fn get_user_activity(
    _caller: AuthUser,
    Path(subject_user_id): Path<i64>,
    Query(q): Query<PageQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FeedPage>> {
    let page = state
        .feed_service
        .get_user_activity(
            subject_user_id,
            q.page.unwrap_or(1),
            q.page_size.unwrap_or(DEFAULT_FEED_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feed", get(get_feed))
        .route("/feed/state", get(get_feed_state))
        .route("/users/{id}/activity", get(get_user_activity))
}
