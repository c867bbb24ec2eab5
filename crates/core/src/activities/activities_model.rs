//! Activity event domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Longest description accepted on an activity event.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// The closed set of actions recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    StartupCreated,
    StartupUpdated,
    OpportunityPosted,
    OpportunitySaved,
    StartupSaved,
    StartupFollowed,
    ApplicationCreated,
    ApplicationAccepted,
    MessageSent,
    ConnectionMade,
    RecommendationViewed,
    ProfileUpdated,
}

impl ActionType {
    pub const ALL: [ActionType; 12] = [
        ActionType::StartupCreated,
        ActionType::StartupUpdated,
        ActionType::OpportunityPosted,
        ActionType::OpportunitySaved,
        ActionType::StartupSaved,
        ActionType::StartupFollowed,
        ActionType::ApplicationCreated,
        ActionType::ApplicationAccepted,
        ActionType::MessageSent,
        ActionType::ConnectionMade,
        ActionType::RecommendationViewed,
        ActionType::ProfileUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::StartupCreated => "startup_created",
            ActionType::StartupUpdated => "startup_updated",
            ActionType::OpportunityPosted => "opportunity_posted",
            ActionType::OpportunitySaved => "opportunity_saved",
            ActionType::StartupSaved => "startup_saved",
            ActionType::StartupFollowed => "startup_followed",
            ActionType::ApplicationCreated => "application_created",
            ActionType::ApplicationAccepted => "application_accepted",
            ActionType::MessageSent => "message_sent",
            ActionType::ConnectionMade => "connection_made",
            ActionType::RecommendationViewed => "recommendation_viewed",
            ActionType::ProfileUpdated => "profile_updated",
        }
    }

    /// Actions by which a user expresses interest in an entity. Recording one
    /// of these changes the user's exclusion set, so their recommendations
    /// must be recomputed.
    pub fn is_interest_signal(&self) -> bool {
        matches!(
            self,
            ActionType::StartupSaved
                | ActionType::StartupFollowed
                | ActionType::OpportunitySaved
                | ActionType::ApplicationCreated
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ActionType::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidActionType(s.to_string()))
    }
}

/// Kinds of entity an activity event can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Startup,
    Opportunity,
    User,
    Application,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Startup => "startup",
            SubjectKind::Opportunity => "opportunity",
            SubjectKind::User => "user",
            SubjectKind::Application => "application",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "startup" => Ok(SubjectKind::Startup),
            "opportunity" => Ok(SubjectKind::Opportunity),
            "user" => Ok(SubjectKind::User),
            "application" => Ok(SubjectKind::Application),
            other => Err(ValidationError::InvalidSubjectKind(other.to_string())),
        }
    }
}

/// Typed reference to the entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubjectRef {
    Startup(i64),
    Opportunity(i64),
    User(i64),
    Application(i64),
}

impl SubjectRef {
    pub fn new(kind: SubjectKind, id: i64) -> Self {
        match kind {
            SubjectKind::Startup => SubjectRef::Startup(id),
            SubjectKind::Opportunity => SubjectRef::Opportunity(id),
            SubjectKind::User => SubjectRef::User(id),
            SubjectKind::Application => SubjectRef::Application(id),
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            SubjectRef::Startup(_) => SubjectKind::Startup,
            SubjectRef::Opportunity(_) => SubjectKind::Opportunity,
            SubjectRef::User(_) => SubjectKind::User,
            SubjectRef::Application(_) => SubjectKind::Application,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            SubjectRef::Startup(id)
            | SubjectRef::Opportunity(id)
            | SubjectRef::User(id)
            | SubjectRef::Application(id) => *id,
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A persisted, immutable activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub actor_id: i64,
    pub action_type: ActionType,
    pub subject: SubjectRef,
    pub description: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for appending an event. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivityEvent {
    pub actor_id: i64,
    pub action_type: ActionType,
    pub subject: SubjectRef,
    pub description: String,
    pub is_public: bool,
}

impl NewActivityEvent {
    pub fn new(
        actor_id: i64,
        action_type: ActionType,
        subject: SubjectRef,
        description: impl Into<String>,
        is_public: bool,
    ) -> Self {
        Self {
            actor_id,
            action_type,
            subject,
            description: description.into(),
            is_public,
        }
    }

    /// Builds an event from untyped input, as received from the action API.
    pub fn parse(
        actor_id: i64,
        action_type: &str,
        subject_kind: &str,
        subject_id: i64,
        description: Option<String>,
        is_public: bool,
    ) -> Result<Self> {
        let action_type: ActionType = action_type.parse()?;
        let kind: SubjectKind = subject_kind.parse()?;
        let event = Self {
            actor_id,
            action_type,
            subject: SubjectRef::new(kind, subject_id),
            description: description.unwrap_or_default(),
            is_public,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<()> {
        if self.actor_id <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "actor_id must be positive, got {}",
                self.actor_id
            ))
            .into());
        }
        if self.subject.id() <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "subject id must be positive, got {}",
                self.subject.id()
            ))
            .into());
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::InvalidInput(format!(
                "description exceeds {} characters",
                MAX_DESCRIPTION_LEN
            ))
            .into());
        }
        Ok(())
    }
}

/// Which events a reader is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "userId")]
pub enum Visibility {
    /// Only events flagged public.
    Public,
    /// Public events plus the viewer's own private ones.
    Viewer(i64),
    /// Every event. Used for internal signal computation only.
    All,
}

/// Union of two event sets: events of the listed action types, and events
/// about the listed subjects whatever their type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivityScope {
    pub action_types: Vec<ActionType>,
    pub subjects: Vec<SubjectRef>,
}

impl ActivityScope {
    pub fn matches(&self, event: &ActivityEvent) -> bool {
        self.action_types.contains(&event.action_type) || self.subjects.contains(&event.subject)
    }
}

/// Filter applied to activity queries. Every set field must match.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityFilter {
    pub actor_id: Option<i64>,
    pub exclude_actor: Option<i64>,
    pub action_types: Option<Vec<ActionType>>,
    pub scope: Option<ActivityScope>,
    pub visibility: Visibility,
    pub created_after: Option<DateTime<Utc>>,
}

impl Default for ActivityFilter {
    fn default() -> Self {
        Self {
            actor_id: None,
            exclude_actor: None,
            action_types: None,
            scope: None,
            visibility: Visibility::Public,
            created_after: None,
        }
    }
}

impl ActivityFilter {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn for_actor(actor_id: i64) -> Self {
        Self {
            actor_id: Some(actor_id),
            ..Self::default()
        }
    }

    pub fn with_action_types(mut self, action_types: Vec<ActionType>) -> Self {
        self.action_types = Some(action_types);
        self
    }

    pub fn excluding_actor(mut self, actor_id: i64) -> Self {
        self.exclude_actor = Some(actor_id);
        self
    }

    pub fn within(mut self, scope: ActivityScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn created_after(mut self, since: DateTime<Utc>) -> Self {
        self.created_after = Some(since);
        self
    }

    /// In-memory evaluation of the filter. Storage backends translate the
    /// same rules into their query language.
    pub fn matches(&self, event: &ActivityEvent) -> bool {
        if let Some(actor_id) = self.actor_id {
            if event.actor_id != actor_id {
                return false;
            }
        }
        if self.exclude_actor == Some(event.actor_id) {
            return false;
        }
        if let Some(types) = &self.action_types {
            if !types.contains(&event.action_type) {
                return false;
            }
        }
        if let Some(scope) = &self.scope {
            if !scope.matches(event) {
                return false;
            }
        }
        if let Some(since) = self.created_after {
            if event.created_at < since {
                return false;
            }
        }
        match self.visibility {
            Visibility::Public => event.is_public,
            Visibility::Viewer(viewer) => event.is_public || event.actor_id == viewer,
            Visibility::All => true,
        }
    }
}

/// One page of events in `(created_at desc, id desc)` order, plus the total
/// number of events matching the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPage {
    pub events: Vec<ActivityEvent>,
    pub total: usize,
}

impl ActivityPage {
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            total: 0,
        }
    }
}
