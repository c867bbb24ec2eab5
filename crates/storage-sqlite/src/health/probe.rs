use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use collabhub_core::health::HealthProbe;
use collabhub_core::Result;

use crate::db::get_connection;
use crate::errors::StorageError;

/// Checks out a pooled connection and runs a trivial query.
pub struct SqliteHealthProbe {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl SqliteHealthProbe {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for SqliteHealthProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(StorageError::from)?;
        let state = self.pool.state();
        Ok(Some(format!(
            "{} connections, {} idle",
            state.connections, state.idle_connections
        )))
    }
}
