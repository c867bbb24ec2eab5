use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activities::{SubjectKind, SubjectRef};
use crate::directory::UserRole;
use crate::errors::ValidationError;

/// What is being recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Startup,
    Opportunity,
    Talent,
}

impl RecommendationKind {
    pub const ALL: [RecommendationKind; 3] = [
        RecommendationKind::Startup,
        RecommendationKind::Opportunity,
        RecommendationKind::Talent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::Startup => "startup",
            RecommendationKind::Opportunity => "opportunity",
            RecommendationKind::Talent => "talent",
        }
    }

    /// Kind served when the caller does not ask for one.
    pub fn default_for(role: UserRole) -> Self {
        match role {
            UserRole::Talent => RecommendationKind::Startup,
            UserRole::Founder => RecommendationKind::Talent,
            UserRole::Investor => RecommendationKind::Startup,
        }
    }

    pub fn subject_kind(&self) -> SubjectKind {
        match self {
            RecommendationKind::Startup => SubjectKind::Startup,
            RecommendationKind::Opportunity => SubjectKind::Opportunity,
            RecommendationKind::Talent => SubjectKind::User,
        }
    }

    pub fn entity_ref(&self, id: i64) -> SubjectRef {
        match self {
            RecommendationKind::Startup => SubjectRef::Startup(id),
            RecommendationKind::Opportunity => SubjectRef::Opportunity(id),
            RecommendationKind::Talent => SubjectRef::User(id),
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "startup" | "startups" => Ok(RecommendationKind::Startup),
            "opportunity" | "opportunities" => Ok(RecommendationKind::Opportunity),
            "talent" => Ok(RecommendationKind::Talent),
            other => Err(ValidationError::UnknownRecommendationKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub entity: SubjectRef,
    pub name: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub kind: RecommendationKind,
    pub items: Vec<RecommendationItem>,
}

impl Recommendations {
    pub fn empty(kind: RecommendationKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }
}

/// Full ranked list for one `(user, kind)`. Served truncated to the
/// requested limit and never past `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CachedRecommendations {
    pub items: Vec<RecommendationItem>,
    pub expires_at: DateTime<Utc>,
}

pub(crate) fn recommendations_key(user_id: i64, kind: RecommendationKind) -> String {
    format!("recs:{}:{}", user_id, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            "startup".parse::<RecommendationKind>().unwrap(),
            RecommendationKind::Startup
        );
        assert_eq!(
            "opportunities".parse::<RecommendationKind>().unwrap(),
            RecommendationKind::Opportunity
        );
        assert_eq!(
            "investors".parse::<RecommendationKind>().unwrap_err(),
            ValidationError::UnknownRecommendationKind("investors".to_string())
        );
    }

    #[test]
    fn test_role_defaults() {
        assert_eq!(
            RecommendationKind::default_for(UserRole::Talent),
            RecommendationKind::Startup
        );
        assert_eq!(
            RecommendationKind::default_for(UserRole::Founder),
            RecommendationKind::Talent
        );
        assert_eq!(
            RecommendationKind::default_for(UserRole::Investor),
            RecommendationKind::Startup
        );
    }

    #[test]
    fn test_cache_key_shape() {
        assert_eq!(
            recommendations_key(12, RecommendationKind::Talent),
            "recs:12:talent"
        );
    }
}
