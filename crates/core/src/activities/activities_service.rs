use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::activities_model::{ActivityEvent, ActivityFilter, ActivityPage, NewActivityEvent};
use super::activities_traits::{ActivityRepositoryTrait, ActivityServiceTrait};
use crate::errors::{Result, ValidationError};

/// Service for the append-only activity log.
pub struct ActivityService {
    repository: Arc<dyn ActivityRepositoryTrait>,
}

impl ActivityService {
    pub fn new(repository: Arc<dyn ActivityRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ActivityServiceTrait for ActivityService {
    async fn append(&self, new_event: NewActivityEvent) -> Result<ActivityEvent> {
        new_event.validate()?;
        let event = self.repository.append(new_event).await?;
        debug!(
            "Appended activity {} ({} by user {} on {})",
            event.id, event.action_type, event.actor_id, event.subject
        );
        Ok(event)
    }

    fn query(&self, filter: &ActivityFilter, cursor: usize, limit: usize) -> Result<ActivityPage> {
        if limit == 0 {
            return Err(ValidationError::InvalidInput("limit must be positive".to_string()).into());
        }
        if let Some(types) = &filter.action_types {
            if types.is_empty() {
                return Ok(ActivityPage::empty());
            }
        }
        if let Some(scope) = &filter.scope {
            if scope.action_types.is_empty() && scope.subjects.is_empty() {
                return Ok(ActivityPage::empty());
            }
        }
        self.repository.query(filter, cursor, limit)
    }
}
