//! Database models for directory tables.

use diesel::prelude::*;

use collabhub_core::activities::SubjectRef;
use collabhub_core::directory::{Candidate, UserProfile, UserRole};

use crate::errors::StorageError;
use crate::utils::{parse_timestamp, split_tags};

fn count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub tags: String,
    pub discipline: Option<String>,
    pub followed_count: i32,
    pub saved_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl UserDB {
    fn parse_role(&self) -> Result<UserRole, StorageError> {
        self.role
            .parse()
            .map_err(|e| StorageError::CorruptRow(format!("user {}: {}", self.id, e)))
    }

    pub fn into_profile(self) -> Result<UserProfile, StorageError> {
        Ok(UserProfile {
            id: self.id,
            role: self.parse_role()?,
            tags: split_tags(&self.tags),
        })
    }

    pub fn into_candidate(self) -> Result<Candidate, StorageError> {
        Ok(Candidate {
            entity: SubjectRef::User(self.id),
            tags: split_tags(&self.tags),
            category: self.discipline,
            funding_stage: None,
            owner_id: None,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            followed_count: count(self.followed_count),
            saved_count: count(self.saved_count),
            name: self.name,
        })
    }
}

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::startups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StartupDB {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub industry: Option<String>,
    pub funding_stage: Option<String>,
    pub tags: String,
    pub followed_count: i32,
    pub saved_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<StartupDB> for Candidate {
    type Error = StorageError;

    fn try_from(db: StartupDB) -> Result<Self, Self::Error> {
        Ok(Candidate {
            entity: SubjectRef::Startup(db.id),
            name: db.name,
            tags: split_tags(&db.tags),
            category: db.industry,
            funding_stage: db.funding_stage,
            owner_id: Some(db.owner_id),
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            followed_count: count(db.followed_count),
            saved_count: count(db.saved_count),
        })
    }
}

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::opportunities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OpportunityDB {
    pub id: i64,
    pub startup_id: Option<i64>,
    pub owner_id: i64,
    pub title: String,
    pub industry: Option<String>,
    pub tags: String,
    pub followed_count: i32,
    pub saved_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<OpportunityDB> for Candidate {
    type Error = StorageError;

    fn try_from(db: OpportunityDB) -> Result<Self, Self::Error> {
        Ok(Candidate {
            entity: SubjectRef::Opportunity(db.id),
            name: db.title,
            tags: split_tags(&db.tags),
            category: db.industry,
            funding_stage: None,
            owner_id: Some(db.owner_id),
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            followed_count: count(db.followed_count),
            saved_count: count(db.saved_count),
        })
    }
}

#[derive(Queryable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::user_interactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InteractionDB {
    pub user_id: i64,
    pub subject_kind: String,
    pub subject_id: i64,
    pub interaction: String,
}
