//! Shared test doubles for the core services.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::activities::{
    ActivityEvent, ActivityFilter, ActivityPage, ActivityRepositoryTrait, NewActivityEvent,
    SubjectRef,
};
use crate::cache::{CacheBackend, CacheError};
use crate::directory::{
    Candidate, CandidateProviderTrait, CandidateQuery, InteractionProviderTrait, UserDirectoryTrait,
    UserInteractions, UserProfile,
};
use crate::errors::{DatabaseError, Error, Result};
use crate::feeds::{FeedRepositoryTrait, FeedState};
use crate::tasks::{Notification, NotificationSink};

// --- Activity store ---

/// In-memory append-only store with the same ordering rules as SQLite.
#[derive(Clone, Default)]
pub struct InMemoryActivityRepository {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
    fail_appends: Arc<Mutex<bool>>,
    fail_queries: Arc<AtomicBool>,
    query_count: Arc<AtomicUsize>,
}

impl InMemoryActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an event with an explicit timestamp.
    pub fn seed(&self, new_event: NewActivityEvent, created_at: DateTime<Utc>) -> ActivityEvent {
        let mut events = self.events.lock().unwrap();
        let event = ActivityEvent {
            id: events.len() as i64 + 1,
            actor_id: new_event.actor_id,
            action_type: new_event.action_type,
            subject: new_event.subject,
            description: new_event.description,
            is_public: new_event.is_public,
            created_at,
        };
        events.push(event.clone());
        event
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn set_fail_appends(&self, fail: bool) {
        *self.fail_appends.lock().unwrap() = fail;
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivityRepositoryTrait for InMemoryActivityRepository {
    async fn append(&self, new_event: NewActivityEvent) -> Result<ActivityEvent> {
        if *self.fail_appends.lock().unwrap() {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "disk I/O error".to_string(),
            )));
        }
        let now = Utc::now();
        let created_at = self
            .events
            .lock()
            .unwrap()
            .last()
            .map(|e| e.created_at.max(now))
            .unwrap_or(now);
        Ok(self.seed(new_event, created_at))
    }

    fn query(&self, filter: &ActivityFilter, cursor: usize, limit: usize) -> Result<ActivityPage> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "db down".to_string(),
            )));
        }
        let mut matching: Vec<ActivityEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matching.len();
        let events = matching.into_iter().skip(cursor).take(limit).collect();
        Ok(ActivityPage { events, total })
    }
}

// --- Feed state ---

#[derive(Clone, Default)]
pub struct MockFeedRepository {
    states: Arc<Mutex<HashMap<i64, FeedState>>>,
}

impl MockFeedRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedRepositoryTrait for MockFeedRepository {
    fn get_state(&self, user_id: i64) -> Result<Option<FeedState>> {
        Ok(self.states.lock().unwrap().get(&user_id).cloned())
    }

    async fn advance_cursor(&self, user_id: i64, cursor: i64) -> Result<FeedState> {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(user_id).or_insert(FeedState {
            user_id,
            last_activity_cursor: 0,
            last_updated: Utc::now(),
        });
        state.last_activity_cursor = state.last_activity_cursor.max(cursor);
        state.last_updated = Utc::now();
        Ok(state.clone())
    }
}

// --- Notifications ---

#[derive(Clone, Default)]
pub struct MockNotificationSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
    fail_titles: Arc<Mutex<Vec<String>>>,
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }

    /// Makes delivery fail for notifications with this title.
    pub fn fail_on(&self, title: &str) {
        self.fail_titles.lock().unwrap().push(title.to_string());
    }
}

#[async_trait]
impl NotificationSink for MockNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        if self
            .fail_titles
            .lock()
            .unwrap()
            .contains(&notification.title)
        {
            return Err(Error::Notification("sink rejected message".to_string()));
        }
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// --- Directory ---

#[derive(Clone, Default)]
pub struct MockDirectory {
    users: Arc<Mutex<HashMap<i64, UserProfile>>>,
    candidates: Arc<Mutex<Vec<Candidate>>>,
    categories: Arc<Mutex<HashMap<SubjectRef, String>>>,
    interactions: Arc<Mutex<HashMap<i64, UserInteractions>>>,
    fail_candidates: Arc<Mutex<bool>>,
    candidate_calls: Arc<AtomicUsize>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: UserProfile) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn add_candidate(&self, candidate: Candidate) {
        if let Some(category) = &candidate.category {
            self.categories
                .lock()
                .unwrap()
                .insert(candidate.entity, category.clone());
        }
        self.candidates.lock().unwrap().push(candidate);
    }

    pub fn clear_candidates(&self) {
        self.candidates.lock().unwrap().clear();
    }

    pub fn set_interactions(&self, user_id: i64, interactions: UserInteractions) {
        self.interactions
            .lock()
            .unwrap()
            .insert(user_id, interactions);
    }

    pub fn set_fail_candidates(&self, fail: bool) {
        *self.fail_candidates.lock().unwrap() = fail;
    }

    pub fn candidate_calls(&self) -> usize {
        self.candidate_calls.load(Ordering::SeqCst)
    }
}

impl UserDirectoryTrait for MockDirectory {
    fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}

impl CandidateProviderTrait for MockDirectory {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>> {
        self.candidate_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_candidates.lock().unwrap() {
            return Err(Error::Database(DatabaseError::ConnectionFailed(
                "connection refused".to_string(),
            )));
        }
        let mut list: Vec<Candidate> = self
            .candidates
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.entity.kind() == query.kind.subject_kind())
            .filter(|c| query.active_since.map_or(true, |since| c.updated_at >= since))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.followed_count.cmp(&a.followed_count));
        list.truncate(query.limit);
        Ok(list)
    }

    fn categories_of(&self, subjects: &[SubjectRef]) -> Result<HashMap<SubjectRef, String>> {
        let categories = self.categories.lock().unwrap();
        Ok(subjects
            .iter()
            .filter_map(|s| categories.get(s).map(|c| (*s, c.clone())))
            .collect())
    }
}

impl InteractionProviderTrait for MockDirectory {
    fn interactions(&self, user_id: i64) -> Result<UserInteractions> {
        Ok(self
            .interactions
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}

// --- Cache backends ---

/// Healthy backend that records what was written. Ignores TTLs.
#[derive(Clone, Default)]
pub struct RecordingCache {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl CacheBackend for RecordingCache {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        Ok(self.value(key))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        _ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> std::result::Result<(), CacheError> {
        let mut values = self.values.lock().unwrap();
        for key in keys {
            values.remove(key);
        }
        Ok(())
    }
}

/// Recording backend that can be taken down and brought back.
#[derive(Clone, Default)]
pub struct ToggleCache {
    inner: RecordingCache,
    down: Arc<AtomicBool>,
}

impl ToggleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &RecordingCache {
        &self.inner
    }

    fn check(&self) -> std::result::Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                backend: "toggle",
                reason: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for ToggleCache {
    fn name(&self) -> &'static str {
        "toggle"
    }

    async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, keys: &[String]) -> std::result::Result<(), CacheError> {
        self.check()?;
        self.inner.delete(keys).await
    }
}

/// Unreachable backend: either errors immediately or never answers.
pub struct FailingCache {
    hang: bool,
}

impl FailingCache {
    pub fn erroring() -> Self {
        Self { hang: false }
    }

    pub fn hanging() -> Self {
        Self { hang: true }
    }

    async fn fail<T>(&self) -> std::result::Result<T, CacheError> {
        if self.hang {
            futures::future::pending::<()>().await;
        }
        Err(CacheError::Unavailable {
            backend: "failing",
            reason: "connection refused".to_string(),
        })
    }
}

#[async_trait]
impl CacheBackend for FailingCache {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> std::result::Result<Option<String>, CacheError> {
        self.fail().await
    }

    async fn set(
        &self,
        _key: &str,
        _value: String,
        _ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        self.fail().await
    }

    async fn delete(&self, _keys: &[String]) -> std::result::Result<(), CacheError> {
        self.fail().await
    }
}
