use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, warn};

use super::recommendations_model::{
    recommendations_key, CachedRecommendations, RecommendationItem, RecommendationKind,
    Recommendations,
};
use super::recommendations_traits::RecommendationServiceTrait;
use super::scoring::{compare_ranked, Scorer, ScoringContext};
use crate::activities::{
    ActivityEvent, ActivityFilter, ActivityServiceTrait, SubjectRef, Visibility,
};
use crate::cache::{delete_keys, get_json, set_json, CacheBackend};
use crate::constants::{
    AFFINITY_EVENT_LIMIT, AFFINITY_WINDOW_DAYS, INVESTOR_ACTIVITY_WINDOW_DAYS, MAX_CANDIDATES,
    MAX_RECOMMENDATION_LIMIT, RECOMMENDATIONS_CACHE_TTL,
};
use crate::directory::{
    Candidate, CandidateProviderTrait, CandidateQuery, InteractionProviderTrait, UserDirectoryTrait,
    UserProfile, UserRole,
};
use crate::errors::{Error, Result, ValidationError};
use crate::tasks::ActivityObserver;

#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    pub ttl: Duration,
    pub max_limit: usize,
    pub max_candidates: usize,
    pub affinity_window_days: i64,
    pub affinity_event_limit: usize,
    pub investor_activity_days: i64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            ttl: RECOMMENDATIONS_CACHE_TTL,
            max_limit: MAX_RECOMMENDATION_LIMIT,
            max_candidates: MAX_CANDIDATES,
            affinity_window_days: AFFINITY_WINDOW_DAYS,
            affinity_event_limit: AFFINITY_EVENT_LIMIT,
            investor_activity_days: INVESTOR_ACTIVITY_WINDOW_DAYS,
        }
    }
}

/// Dependencies for [`RecommendationService`].
pub struct RecommendationDeps {
    pub users: Arc<dyn UserDirectoryTrait>,
    pub candidates: Arc<dyn CandidateProviderTrait>,
    pub interactions: Arc<dyn InteractionProviderTrait>,
    pub activity_service: Arc<dyn ActivityServiceTrait>,
    pub cache: Arc<dyn CacheBackend>,
    pub scorer: Arc<dyn Scorer>,
}

pub struct RecommendationService {
    deps: RecommendationDeps,
    config: RecommendationConfig,
}

impl RecommendationService {
    pub fn new(deps: RecommendationDeps, config: RecommendationConfig) -> Self {
        Self { deps, config }
    }

    fn load_user(&self, user_id: i64) -> Result<UserProfile> {
        Ok(self
            .deps
            .users
            .get_user(user_id)?
            .unwrap_or_else(|| UserProfile {
                id: user_id,
                role: UserRole::Talent,
                tags: Vec::new(),
            }))
    }

    /// Recent events of the user, grouped by the category of their subject.
    fn category_affinity(&self, user_id: i64) -> Result<HashMap<String, usize>> {
        let since = Utc::now() - chrono::Duration::days(self.config.affinity_window_days);
        let filter = ActivityFilter::for_actor(user_id)
            .with_visibility(Visibility::All)
            .created_after(since);
        let recent = self
            .deps
            .activity_service
            .query(&filter, 0, self.config.affinity_event_limit)?;
        if recent.events.is_empty() {
            return Ok(HashMap::new());
        }

        let subjects: Vec<_> = recent.events.iter().map(|e| e.subject).collect();
        let categories = self.deps.candidates.categories_of(&subjects)?;

        let mut affinity = HashMap::new();
        for event in &recent.events {
            if let Some(category) = categories.get(&event.subject) {
                *affinity.entry(category.trim().to_lowercase()).or_insert(0) += 1;
            }
        }
        Ok(affinity)
    }

    /// Drops cached items the user interacted with since they were cached.
    /// Covers invalidations the distributed cache missed during an outage.
    fn without_interacted(
        &self,
        user_id: i64,
        items: Vec<RecommendationItem>,
    ) -> Vec<RecommendationItem> {
        match self.deps.interactions.interactions(user_id) {
            Ok(interactions) => items
                .into_iter()
                .filter(|item| !interactions.contains(&item.entity))
                .collect(),
            Err(e) => {
                warn!(
                    "Failed to load interactions of user {}, serving cached recommendations as is: {}",
                    user_id, e
                );
                items
            }
        }
    }

    fn compute(&self, user: &UserProfile, kind: RecommendationKind) -> Result<Vec<RecommendationItem>> {
        let now = Utc::now();
        let interactions = self.deps.interactions.interactions(user.id)?;

        let active_since = (user.role == UserRole::Investor && kind == RecommendationKind::Startup)
            .then(|| now - chrono::Duration::days(self.config.investor_activity_days));
        let query = CandidateQuery {
            kind,
            active_since,
            limit: self.config.max_candidates,
        };

        let self_ref = SubjectRef::User(user.id);
        let unseen: Vec<Candidate> = self
            .deps
            .candidates
            .candidates(&query)?
            .into_iter()
            .filter(|c| c.entity.kind() == kind.subject_kind())
            .filter(|c| c.entity != self_ref)
            .filter(|c| c.owner_id != Some(user.id))
            .filter(|c| !interactions.contains(&c.entity))
            .collect();

        // Users without tags, or without any overlapping candidate, get the
        // trending list.
        let eligible: Vec<Candidate> = if user.tags.is_empty() {
            unseen
        } else {
            let matching: Vec<Candidate> = unseen
                .iter()
                .filter(|c| c.tag_overlap(&user.tags) > 0)
                .cloned()
                .collect();
            if matching.is_empty() {
                unseen
            } else {
                matching
            }
        };

        let affinity = self.category_affinity(user.id)?;
        let ctx = ScoringContext {
            user,
            now,
            category_affinity: &affinity,
        };

        let mut scored: Vec<(Candidate, f64, String)> = eligible
            .into_iter()
            .map(|candidate| {
                let score = self.deps.scorer.score(&candidate, &ctx);
                (candidate, score.value, score.reason)
            })
            .collect();
        if let Some((candidate, _, _)) = scored.iter().find(|(_, value, _)| !value.is_finite()) {
            return Err(Error::Compute(format!(
                "non-finite score for {}",
                candidate.entity
            )));
        }
        scored.sort_by(|a, b| compare_ranked((&a.0, a.1), (&b.0, b.1)));
        scored.truncate(self.config.max_limit);

        Ok(scored
            .into_iter()
            .map(|(candidate, score, reason)| RecommendationItem {
                entity: candidate.entity,
                name: candidate.name,
                score,
                reason,
            })
            .collect())
    }
}

#[async_trait]
impl RecommendationServiceTrait for RecommendationService {
    async fn get_recommendations(
        &self,
        user_id: i64,
        kind: Option<RecommendationKind>,
        limit: usize,
    ) -> Result<Recommendations> {
        if limit == 0 || limit > self.config.max_limit {
            return Err(ValidationError::InvalidLimit {
                value: limit,
                max: self.config.max_limit,
            }
            .into());
        }

        let user = match self.load_user(user_id) {
            Ok(user) => user,
            Err(e) => {
                let kind = kind.unwrap_or(RecommendationKind::Startup);
                error!(
                    "Failed to load user {} for {} recommendations: {}",
                    user_id, kind, e
                );
                return Ok(Recommendations::empty(kind));
            }
        };
        let kind = kind.unwrap_or_else(|| RecommendationKind::default_for(user.role));

        let key = recommendations_key(user_id, kind);
        if let Some(cached) = get_json::<CachedRecommendations>(self.deps.cache.as_ref(), &key).await
        {
            if cached.expires_at > Utc::now() {
                debug!("Recommendation cache hit for {}", key);
                let mut items = self.without_interacted(user_id, cached.items);
                items.truncate(limit);
                return Ok(Recommendations { kind, items });
            }
        }

        let items = match self.compute(&user, kind) {
            Ok(items) => items,
            Err(e) => {
                error!(
                    "Failed to compute {} recommendations for user {}: {}",
                    kind, user_id, e
                );
                return Ok(Recommendations::empty(kind));
            }
        };

        let ttl_delta = chrono::Duration::from_std(self.config.ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(0));
        let entry = CachedRecommendations {
            items: items.clone(),
            expires_at: Utc::now() + ttl_delta,
        };
        set_json(self.deps.cache.as_ref(), &key, &entry, self.config.ttl).await;

        let mut items = items;
        items.truncate(limit);
        Ok(Recommendations { kind, items })
    }

    async fn invalidate(&self, user_id: i64) {
        let keys: Vec<String> = RecommendationKind::ALL
            .iter()
            .map(|kind| recommendations_key(user_id, *kind))
            .collect();
        delete_keys(self.deps.cache.as_ref(), &keys).await;
        debug!("Invalidated recommendations for user {}", user_id);
    }
}

#[async_trait]
impl ActivityObserver for RecommendationService {
    async fn on_activity_logged(&self, event: &ActivityEvent) {
        if event.action_type.is_interest_signal() {
            self.invalidate(event.actor_id).await;
        }
    }
}
