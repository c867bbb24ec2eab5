use std::collections::HashMap;

use super::directory_model::{Candidate, CandidateQuery, UserInteractions, UserProfile};
use crate::activities::SubjectRef;
use crate::errors::Result;

/// Lookup of user profiles.
pub trait UserDirectoryTrait: Send + Sync {
    fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>>;
}

/// Source of recommendable entities and their metadata.
pub trait CandidateProviderTrait: Send + Sync {
    /// Candidates of `query.kind`, most followed first, capped at `query.limit`.
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>>;

    /// Category of each referenced entity that has one.
    fn categories_of(&self, subjects: &[SubjectRef]) -> Result<HashMap<SubjectRef, String>>;
}

/// Saves, follows and applications recorded by the CRUD layer.
pub trait InteractionProviderTrait: Send + Sync {
    fn interactions(&self, user_id: i64) -> Result<UserInteractions>;
}
