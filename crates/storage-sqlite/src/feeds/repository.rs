use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use collabhub_core::feeds::{FeedRepositoryTrait, FeedState};
use collabhub_core::Result;

use super::model::FeedStateDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::feeds;
use crate::utils::format_timestamp;

pub struct FeedRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl FeedRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl FeedRepositoryTrait for FeedRepository {
    fn get_state(&self, user_id: i64) -> Result<Option<FeedState>> {
        let mut conn = get_connection(&self.pool)?;
        let row = feeds::table
            .find(user_id)
            .select(FeedStateDB::as_select())
            .first::<FeedStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(FeedState::try_from).transpose()?)
    }

    async fn advance_cursor(&self, user_id: i64, cursor: i64) -> Result<FeedState> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FeedState> {
                let current: Option<i64> = feeds::table
                    .find(user_id)
                    .select(feeds::last_activity_cursor)
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let row = FeedStateDB {
                    user_id,
                    last_activity_cursor: current.map_or(cursor, |c| c.max(cursor)),
                    last_updated: format_timestamp(Utc::now()),
                };
                diesel::insert_into(feeds::table)
                    .values(&row)
                    .on_conflict(feeds::user_id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(FeedState::try_from(row)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use tempfile::tempdir;

    async fn create_test_repository() -> (FeedRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (FeedRepository::new(pool, writer), temp_dir)
    }

    #[tokio::test]
    async fn test_cursor_is_created_then_only_moves_forward() {
        let (repo, _dir) = create_test_repository().await;
        assert_eq!(repo.get_state(7).unwrap(), None);

        repo.advance_cursor(7, 10).await.unwrap();
        let state = repo.advance_cursor(7, 4).await.unwrap();
        assert_eq!(state.last_activity_cursor, 10);

        repo.advance_cursor(7, 12).await.unwrap();
        let stored = repo.get_state(7).unwrap().unwrap();
        assert_eq!(stored.user_id, 7);
        assert_eq!(stored.last_activity_cursor, 12);
    }
}
