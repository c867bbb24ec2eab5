use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};

use super::feeds_model::{
    relevant_action_types, CachedFeedPage, FeedPage, FeedRequest, FeedState,
};
use super::feeds_traits::{FeedRepositoryTrait, FeedServiceTrait};
use crate::activities::{
    ActivityEvent, ActivityFilter, ActivityScope, ActivityServiceTrait, SubjectRef,
};
use crate::cache::{get_json, set_json, CacheBackend};
use crate::constants::{FEED_CACHE_TTL, MAX_FEED_INTEREST_SUBJECTS, MAX_FEED_PAGE_SIZE};
use crate::directory::{InteractionProviderTrait, UserDirectoryTrait, UserRole};
use crate::errors::{Result, ValidationError};
use crate::tasks::ActivityObserver;

const FEED_GENERATION_KEY: &str = "feed:generation";

fn feed_page_key(user_id: i64, request: &FeedRequest) -> String {
    let action = request
        .action_type
        .map(|a| a.as_str())
        .unwrap_or("all");
    format!(
        "feed:{}:{}:{}:{}",
        user_id, request.page, request.page_size, action
    )
}

fn user_activity_key(subject_user_id: i64, page: usize, page_size: usize) -> String {
    format!("activity:{}:{}:{}", subject_user_id, page, page_size)
}

fn user_activity_generation_key(subject_user_id: i64) -> String {
    format!("activity:{}:generation", subject_user_id)
}

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub ttl: Duration,
    pub max_page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ttl: FEED_CACHE_TTL,
            max_page_size: MAX_FEED_PAGE_SIZE,
        }
    }
}

/// Builds paginated, cached feeds over the activity log.
///
/// A user's feed holds other users' public events that are either of a
/// role-relevant action type or about an entity the user saved or followed.
///
/// Cached pages carry the generation they were computed at. The generation
/// is the highest logged event id and only moves forward, so any newer
/// public event makes older pages stale on their next read. The TTL bounds
/// staleness when a bump is lost.
///
/// Store failures never reach the caller: they are logged and an empty,
/// uncached page is served.
pub struct FeedService {
    activity_service: Arc<dyn ActivityServiceTrait>,
    repository: Arc<dyn FeedRepositoryTrait>,
    users: Arc<dyn UserDirectoryTrait>,
    interactions: Arc<dyn InteractionProviderTrait>,
    cache: Arc<dyn CacheBackend>,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(
        activity_service: Arc<dyn ActivityServiceTrait>,
        repository: Arc<dyn FeedRepositoryTrait>,
        users: Arc<dyn UserDirectoryTrait>,
        interactions: Arc<dyn InteractionProviderTrait>,
        cache: Arc<dyn CacheBackend>,
        config: FeedConfig,
    ) -> Self {
        Self {
            activity_service,
            repository,
            users,
            interactions,
            cache,
            config,
        }
    }

    fn validate_paging(&self, page: usize, page_size: usize) -> Result<()> {
        if page == 0 {
            return Err(ValidationError::InvalidPage(page).into());
        }
        if page_size == 0 || page_size > self.config.max_page_size {
            return Err(ValidationError::InvalidPageSize {
                value: page_size,
                max: self.config.max_page_size,
            }
            .into());
        }
        Ok(())
    }

    fn role_of(&self, user_id: i64) -> Option<UserRole> {
        match self.users.get_user(user_id) {
            Ok(Some(user)) => Some(user.role),
            Ok(None) => {
                debug!("User {} not in directory, using the general feed", user_id);
                None
            }
            Err(e) => {
                warn!(
                    "Failed to load role of user {}, using the general feed: {}",
                    user_id, e
                );
                None
            }
        }
    }

    /// Entities the user saved or followed, in a stable order.
    fn interest_subjects(&self, user_id: i64) -> Vec<SubjectRef> {
        let found = match self.interactions.interactions(user_id) {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    "Failed to load interactions of user {}, feed limited to role events: {}",
                    user_id, e
                );
                return Vec::new();
            }
        };
        let mut subjects: Vec<SubjectRef> = found.saved.union(&found.followed).copied().collect();
        subjects.sort_by_key(|s| (s.kind().as_str(), s.id()));
        if subjects.len() > MAX_FEED_INTEREST_SUBJECTS {
            debug!(
                "User {} has {} interests, feed uses the first {}",
                user_id,
                subjects.len(),
                MAX_FEED_INTEREST_SUBJECTS
            );
            subjects.truncate(MAX_FEED_INTEREST_SUBJECTS);
        }
        subjects
    }

    async fn generation(&self, key: &str) -> i64 {
        get_json::<i64>(self.cache.as_ref(), key).await.unwrap_or(0)
    }

    /// Raises the generation stored at `key` to `event_id`. Never lowers it.
    async fn bump_generation(&self, key: &str, event_id: i64) {
        if self.generation(key).await >= event_id {
            return;
        }
        set_json(self.cache.as_ref(), key, &event_id, self.config.ttl).await;
    }

    async fn cached_page(&self, key: &str, generation: i64) -> Option<FeedPage> {
        let cached = get_json::<CachedFeedPage>(self.cache.as_ref(), key).await?;
        (cached.generation == generation).then_some(cached.page)
    }

    async fn store_page(&self, key: &str, generation: i64, page: &FeedPage) {
        let envelope = CachedFeedPage {
            generation,
            page: page.clone(),
        };
        set_json(self.cache.as_ref(), key, &envelope, self.config.ttl).await;
    }

    fn load_page(
        &self,
        filter: &ActivityFilter,
        page: usize,
        page_size: usize,
    ) -> Result<FeedPage> {
        let offset = (page - 1).saturating_mul(page_size);
        let result = self.activity_service.query(filter, offset, page_size)?;
        Ok(FeedPage::new(result.total, page, page_size, result.events))
    }

    /// Validation errors propagate. Anything else is logged and `None` is
    /// returned so the caller serves an empty page without caching it.
    fn load_page_or_log(
        &self,
        what: &str,
        user_id: i64,
        filter: &ActivityFilter,
        page: usize,
        page_size: usize,
    ) -> Result<Option<FeedPage>> {
        match self.load_page(filter, page, page_size) {
            Ok(loaded) => Ok(Some(loaded)),
            Err(e) if e.is_validation() => Err(e),
            Err(e) => {
                error!(
                    "Failed to load {} of user {} (page {}, size {}): {}",
                    what, user_id, page, page_size, e
                );
                Ok(None)
            }
        }
    }

    async fn record_cursor(&self, user_id: i64, events: &[ActivityEvent]) {
        let Some(max_id) = events.iter().map(|e| e.id).max() else {
            return;
        };
        if let Err(e) = self.repository.advance_cursor(user_id, max_id).await {
            warn!("Failed to advance feed cursor for user {}: {}", user_id, e);
        }
    }
}

#[async_trait]
impl FeedServiceTrait for FeedService {
    async fn get_feed(&self, user_id: i64, request: FeedRequest) -> Result<FeedPage> {
        self.validate_paging(request.page, request.page_size)?;

        let key = feed_page_key(user_id, &request);
        let generation = self.generation(FEED_GENERATION_KEY).await;
        if let Some(page) = self.cached_page(&key, generation).await {
            debug!("Feed cache hit for {}", key);
            return Ok(page);
        }

        let scope = ActivityScope {
            action_types: relevant_action_types(self.role_of(user_id)),
            subjects: self.interest_subjects(user_id),
        };
        let mut filter = ActivityFilter::public()
            .excluding_actor(user_id)
            .within(scope);
        if let Some(only) = request.action_type {
            filter = filter.with_action_types(vec![only]);
        }

        let Some(page) =
            self.load_page_or_log("feed", user_id, &filter, request.page, request.page_size)?
        else {
            return Ok(FeedPage::new(0, request.page, request.page_size, Vec::new()));
        };

        self.record_cursor(user_id, &page.results).await;
        self.store_page(&key, generation, &page).await;
        Ok(page)
    }

    async fn get_user_activity(
        &self,
        subject_user_id: i64,
        page: usize,
        page_size: usize,
    ) -> Result<FeedPage> {
        self.validate_paging(page, page_size)?;

        let key = user_activity_key(subject_user_id, page, page_size);
        let generation = self
            .generation(&user_activity_generation_key(subject_user_id))
            .await;
        if let Some(cached) = self.cached_page(&key, generation).await {
            return Ok(cached);
        }

        let filter = ActivityFilter::for_actor(subject_user_id);
        let Some(result) =
            self.load_page_or_log("activity", subject_user_id, &filter, page, page_size)?
        else {
            return Ok(FeedPage::new(0, page, page_size, Vec::new()));
        };
        self.store_page(&key, generation, &result).await;
        Ok(result)
    }

    fn get_feed_state(&self, user_id: i64) -> Result<Option<FeedState>> {
        match self.repository.get_state(user_id) {
            Ok(state) => Ok(state),
            Err(e) => {
                error!("Failed to load feed state of user {}: {}", user_id, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ActivityObserver for FeedService {
    async fn on_activity_logged(&self, event: &ActivityEvent) {
        // A private save or follow still widens the actor's own feed scope.
        if event.is_public || event.action_type.is_interest_signal() {
            self.bump_generation(FEED_GENERATION_KEY, event.id).await;
        }
        if event.is_public {
            self.bump_generation(&user_activity_generation_key(event.actor_id), event.id)
                .await;
        }
    }
}
