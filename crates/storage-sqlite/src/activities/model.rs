//! Database models for activity events.

use diesel::prelude::*;

use collabhub_core::activities::{ActivityEvent, NewActivityEvent, SubjectKind, SubjectRef};

use crate::errors::StorageError;
use crate::utils::parse_timestamp;

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::activity_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ActivityEventDB {
    pub id: i64,
    pub actor_id: i64,
    pub action_type: String,
    pub subject_kind: String,
    pub subject_id: i64,
    pub description: String,
    pub is_public: bool,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::activity_events)]
pub struct NewActivityEventDB {
    pub actor_id: i64,
    pub action_type: String,
    pub subject_kind: String,
    pub subject_id: i64,
    pub description: String,
    pub is_public: bool,
    pub created_at: String,
}

impl NewActivityEventDB {
    pub fn from_domain(event: NewActivityEvent, created_at: String) -> Self {
        Self {
            actor_id: event.actor_id,
            action_type: event.action_type.as_str().to_string(),
            subject_kind: event.subject.kind().as_str().to_string(),
            subject_id: event.subject.id(),
            description: event.description,
            is_public: event.is_public,
            created_at,
        }
    }
}

impl TryFrom<ActivityEventDB> for ActivityEvent {
    type Error = StorageError;

    fn try_from(db: ActivityEventDB) -> Result<Self, Self::Error> {
        let corrupt = |e: collabhub_core::errors::ValidationError| {
            StorageError::CorruptRow(format!("activity event {}: {}", db.id, e))
        };
        let action_type = db.action_type.parse().map_err(corrupt)?;
        let kind: SubjectKind = db.subject_kind.parse().map_err(corrupt)?;
        Ok(ActivityEvent {
            id: db.id,
            actor_id: db.actor_id,
            action_type,
            subject: SubjectRef::new(kind, db.subject_id),
            description: db.description,
            is_public: db.is_public,
            created_at: parse_timestamp(&db.created_at)?,
        })
    }
}
