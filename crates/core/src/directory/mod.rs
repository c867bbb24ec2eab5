//! Directory module - read-only contracts over users, startups and opportunities.

mod directory_model;
mod directory_traits;

pub use directory_model::{Candidate, CandidateQuery, UserInteractions, UserProfile, UserRole};
pub use directory_traits::{CandidateProviderTrait, InteractionProviderTrait, UserDirectoryTrait};
