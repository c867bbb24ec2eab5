use async_trait::async_trait;

use super::feeds_model::{FeedPage, FeedRequest, FeedState};
use crate::errors::Result;

/// Trait for feed state persistence.
#[async_trait]
pub trait FeedRepositoryTrait: Send + Sync {
    fn get_state(&self, user_id: i64) -> Result<Option<FeedState>>;

    /// Creates the row if missing and raises the cursor to `cursor` if it is
    /// higher. The cursor never moves backwards.
    async fn advance_cursor(&self, user_id: i64, cursor: i64) -> Result<FeedState>;
}

/// Trait for feed read operations.
#[async_trait]
pub trait FeedServiceTrait: Send + Sync {
    async fn get_feed(&self, user_id: i64, request: FeedRequest) -> Result<FeedPage>;

    /// Public events performed by `subject_user_id`. Visible to any caller.
    async fn get_user_activity(
        &self,
        subject_user_id: i64,
        page: usize,
        page_size: usize,
    ) -> Result<FeedPage>;

    fn get_feed_state(&self, user_id: i64) -> Result<Option<FeedState>>;
}
