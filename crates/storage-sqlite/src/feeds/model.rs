//! Database model for feed cursor state.

use diesel::prelude::*;

use collabhub_core::feeds::FeedState;

use crate::errors::StorageError;
use crate::utils::parse_timestamp;

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::feeds)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeedStateDB {
    pub user_id: i64,
    pub last_activity_cursor: i64,
    pub last_updated: String,
}

impl TryFrom<FeedStateDB> for FeedState {
    type Error = StorageError;

    fn try_from(db: FeedStateDB) -> Result<Self, Self::Error> {
        Ok(FeedState {
            user_id: db.user_id,
            last_activity_cursor: db.last_activity_cursor,
            last_updated: parse_timestamp(&db.last_updated)?,
        })
    }
}
