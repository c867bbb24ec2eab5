use async_trait::async_trait;

use crate::activities::activities_model::{
    ActivityEvent, ActivityFilter, ActivityPage, NewActivityEvent,
};
use crate::errors::Result;

/// Trait defining the contract for the append-only activity store.
#[async_trait]
pub trait ActivityRepositoryTrait: Send + Sync {
    /// Persists a new event. The store assigns `id` and `created_at`.
    async fn append(&self, new_event: NewActivityEvent) -> Result<ActivityEvent>;

    /// Returns events matching `filter`, newest first, skipping `cursor`
    /// events and returning at most `limit`.
    fn query(&self, filter: &ActivityFilter, cursor: usize, limit: usize) -> Result<ActivityPage>;
}

/// Trait defining the contract for activity service operations.
#[async_trait]
pub trait ActivityServiceTrait: Send + Sync {
    async fn append(&self, new_event: NewActivityEvent) -> Result<ActivityEvent>;

    fn query(&self, filter: &ActivityFilter, cursor: usize, limit: usize) -> Result<ActivityPage>;
}
