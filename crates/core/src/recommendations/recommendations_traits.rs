use async_trait::async_trait;

use super::recommendations_model::{RecommendationKind, Recommendations};
use crate::errors::Result;

/// Trait for recommendation operations.
#[async_trait]
pub trait RecommendationServiceTrait: Send + Sync {
    /// Ranked recommendations for `user_id`. When `kind` is `None` it is
    /// derived from the user's role. Only invalid input is reported as an
    /// error; computation failures yield an empty list.
    async fn get_recommendations(
        &self,
        user_id: i64,
        kind: Option<RecommendationKind>,
        limit: usize,
    ) -> Result<Recommendations>;

    /// Drops every cached recommendation kind for the user.
    async fn invalidate(&self, user_id: i64);
}
