//! Read-only views of the platform entities owned by the CRUD layer.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activities::SubjectRef;
use crate::errors::ValidationError;
use crate::recommendations::RecommendationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Talent,
    Founder,
    Investor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Talent => "talent",
            UserRole::Founder => "founder",
            UserRole::Investor => "investor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "talent" => Ok(UserRole::Talent),
            "founder" => Ok(UserRole::Founder),
            "investor" => Ok(UserRole::Investor),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub role: UserRole,
    /// Skills for talent, focus areas for founders and investors.
    pub tags: Vec<String>,
}

/// An entity that may be recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub entity: SubjectRef,
    pub name: String,
    pub tags: Vec<String>,
    /// Industry for startups and opportunities, primary discipline for talent.
    pub category: Option<String>,
    pub funding_stage: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub followed_count: u32,
    pub saved_count: u32,
}

impl Candidate {
    /// Number of candidate tags shared with `tags`, case-insensitively.
    pub fn tag_overlap(&self, tags: &[String]) -> usize {
        let wanted: HashSet<String> = tags.iter().map(|t| t.trim().to_lowercase()).collect();
        self.tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .intersection(&wanted)
            .count()
    }
}

/// Parameters for fetching candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub kind: RecommendationKind,
    /// Only candidates updated at or after this instant.
    pub active_since: Option<DateTime<Utc>>,
    pub limit: usize,
}

/// Entities the user already interacted with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInteractions {
    pub saved: HashSet<SubjectRef>,
    pub followed: HashSet<SubjectRef>,
    pub applied: HashSet<SubjectRef>,
}

impl UserInteractions {
    pub fn contains(&self, entity: &SubjectRef) -> bool {
        self.saved.contains(entity) || self.followed.contains(entity) || self.applied.contains(entity)
    }
}
