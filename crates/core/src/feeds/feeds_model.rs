use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activities::{ActionType, ActivityEvent};
use crate::constants::DEFAULT_FEED_PAGE_SIZE;
use crate::directory::UserRole;

/// Per-user feed bookkeeping row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    pub user_id: i64,
    /// Highest activity event id incorporated into this user's feed.
    pub last_activity_cursor: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    pub action_type: Option<ActionType>,
}

impl Default for FeedRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_FEED_PAGE_SIZE,
            action_type: None,
        }
    }
}

/// A page of feed events. `next` and `previous` are page numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub count: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<ActivityEvent>,
}

impl FeedPage {
    pub fn new(count: usize, page: usize, page_size: usize, results: Vec<ActivityEvent>) -> Self {
        Self {
            count,
            next: (page.saturating_mul(page_size) < count).then_some(page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        }
    }
}

/// Cached page tagged with the generation it was computed at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CachedFeedPage {
    pub generation: i64,
    pub page: FeedPage,
}

/// Action types surfaced in the feed of a user with the given role.
pub fn relevant_action_types(role: Option<UserRole>) -> Vec<ActionType> {
    match role {
        Some(UserRole::Talent) => vec![
            ActionType::StartupCreated,
            ActionType::StartupUpdated,
            ActionType::OpportunityPosted,
            ActionType::ApplicationAccepted,
            ActionType::ConnectionMade,
        ],
        Some(UserRole::Founder) => vec![
            ActionType::StartupCreated,
            ActionType::StartupFollowed,
            ActionType::StartupSaved,
            ActionType::OpportunitySaved,
            ActionType::ApplicationCreated,
            ActionType::ConnectionMade,
        ],
        Some(UserRole::Investor) => vec![
            ActionType::StartupCreated,
            ActionType::StartupUpdated,
            ActionType::StartupFollowed,
            ActionType::OpportunityPosted,
            ActionType::ConnectionMade,
        ],
        None => vec![
            ActionType::StartupCreated,
            ActionType::StartupUpdated,
            ActionType::OpportunityPosted,
            ActionType::ConnectionMade,
        ],
    }
}
