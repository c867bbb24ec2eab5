use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::Bool;
use diesel::sqlite::{Sqlite, SqliteConnection};
use std::collections::BTreeMap;
use std::sync::Arc;

use collabhub_core::activities::{
    ActivityEvent, ActivityFilter, ActivityPage, ActivityRepositoryTrait, ActivityScope,
    NewActivityEvent, Visibility,
};
use collabhub_core::Result;

use super::model::{ActivityEventDB, NewActivityEventDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::activity_events;
use crate::utils::format_timestamp;

type Condition = Box<dyn BoxableExpression<activity_events::table, Sqlite, SqlType = Bool>>;

/// `action_type IN (..) OR (subject_kind = k AND subject_id IN (..)) OR ..`
fn scope_condition(scope: &ActivityScope) -> Condition {
    let names: Vec<String> = scope
        .action_types
        .iter()
        .map(|a| a.as_str().to_string())
        .collect();
    let mut ids_by_kind: BTreeMap<&'static str, Vec<i64>> = BTreeMap::new();
    for subject in &scope.subjects {
        ids_by_kind
            .entry(subject.kind().as_str())
            .or_default()
            .push(subject.id());
    }

    let mut condition: Condition = Box::new(activity_events::action_type.eq_any(names));
    for (kind, ids) in ids_by_kind {
        condition = Box::new(
            condition.or(activity_events::subject_kind
                .eq(kind)
                .and(activity_events::subject_id.eq_any(ids))),
        );
    }
    condition
}

/// Repository for the append-only activity log.
pub struct ActivityRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ActivityRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn filtered(filter: &ActivityFilter) -> activity_events::BoxedQuery<'static, Sqlite> {
        let mut query = activity_events::table.into_boxed();

        if let Some(actor) = filter.actor_id {
            query = query.filter(activity_events::actor_id.eq(actor));
        }
        if let Some(excluded) = filter.exclude_actor {
            query = query.filter(activity_events::actor_id.ne(excluded));
        }
        if let Some(ref action_types) = filter.action_types {
            let names: Vec<String> = action_types.iter().map(|a| a.as_str().to_string()).collect();
            query = query.filter(activity_events::action_type.eq_any(names));
        }
        if let Some(ref scope) = filter.scope {
            query = query.filter(scope_condition(scope));
        }
        match filter.visibility {
            Visibility::Public => query = query.filter(activity_events::is_public.eq(true)),
            Visibility::Viewer(viewer) => {
                query = query.filter(
                    activity_events::is_public
                        .eq(true)
                        .or(activity_events::actor_id.eq(viewer)),
                )
            }
            Visibility::All => {}
        }
        if let Some(after) = filter.created_after {
            query = query.filter(activity_events::created_at.gt(format_timestamp(after)));
        }
        query
    }
}

#[async_trait]
impl ActivityRepositoryTrait for ActivityRepository {
    async fn append(&self, new_event: NewActivityEvent) -> Result<ActivityEvent> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ActivityEvent> {
                // Clamp to the newest stored timestamp so ids and timestamps
                // never disagree when the wall clock steps back.
                let latest: Option<String> = activity_events::table
                    .select(diesel::dsl::max(activity_events::created_at))
                    .first(conn)
                    .map_err(StorageError::from)?;
                let now = format_timestamp(Utc::now());
                let created_at = match latest {
                    Some(latest) if latest > now => latest,
                    _ => now,
                };

                let row = NewActivityEventDB::from_domain(new_event, created_at);
                let inserted = diesel::insert_into(activity_events::table)
                    .values(&row)
                    .returning(ActivityEventDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(ActivityEvent::try_from(inserted)?)
            })
            .await
    }

    fn query(&self, filter: &ActivityFilter, cursor: usize, limit: usize) -> Result<ActivityPage> {
        let mut conn = get_connection(&self.pool)?;

        let total: i64 = Self::filtered(filter)
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;

        let rows = Self::filtered(filter)
            .order((
                activity_events::created_at.desc(),
                activity_events::id.desc(),
            ))
            .offset(i64::try_from(cursor).unwrap_or(i64::MAX))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(ActivityEventDB::as_select())
            .load::<ActivityEventDB>(&mut conn)
            .map_err(StorageError::from)?;

        let events = rows
            .into_iter()
            .map(ActivityEvent::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ActivityPage {
            events,
            total: usize::try_from(total).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::Duration;
    use collabhub_core::activities::{ActionType, SubjectRef};
    use tempfile::tempdir;

    async fn create_test_repository() -> (ActivityRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (ActivityRepository::new(pool, writer), temp_dir)
    }

    fn event(actor: i64, action: ActionType, subject: SubjectRef, public: bool) -> NewActivityEvent {
        NewActivityEvent::new(actor, action, subject, "test", public)
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids_and_timestamps() {
        let (repo, _dir) = create_test_repository().await;

        let first = repo
            .append(event(1, ActionType::StartupCreated, SubjectRef::Startup(1), true))
            .await
            .unwrap();
        let second = repo
            .append(event(2, ActionType::StartupSaved, SubjectRef::Startup(1), true))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert!(second.created_at >= first.created_at);
        assert_eq!(first.action_type, ActionType::StartupCreated);
        assert_eq!(first.subject, SubjectRef::Startup(1));
        assert_eq!(first.description, "test");
    }

    #[tokio::test]
    async fn test_query_orders_newest_first_with_offset() {
        let (repo, _dir) = create_test_repository().await;
        for i in 1..=5 {
            repo.append(event(1, ActionType::StartupUpdated, SubjectRef::Startup(i), true))
                .await
                .unwrap();
        }

        let page = repo.query(&ActivityFilter::public(), 1, 2).unwrap();

        assert_eq!(page.total, 5);
        let subjects: Vec<i64> = page.events.iter().map(|e| e.subject.id()).collect();
        assert_eq!(subjects, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_query_filters() {
        let (repo, _dir) = create_test_repository().await;
        repo.append(event(1, ActionType::StartupCreated, SubjectRef::Startup(1), true))
            .await
            .unwrap();
        repo.append(event(1, ActionType::MessageSent, SubjectRef::User(2), false))
            .await
            .unwrap();
        repo.append(event(2, ActionType::OpportunityPosted, SubjectRef::Opportunity(3), true))
            .await
            .unwrap();

        let by_type = ActivityFilter::public()
            .with_action_types(vec![ActionType::OpportunityPosted, ActionType::MessageSent]);
        let page = repo.query(&by_type, 0, 10).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.events[0].actor_id, 2);

        let own = ActivityFilter::for_actor(1).with_visibility(Visibility::Viewer(1));
        assert_eq!(repo.query(&own, 0, 10).unwrap().total, 2);

        let public_only = ActivityFilter::for_actor(1);
        assert_eq!(repo.query(&public_only, 0, 10).unwrap().total, 1);

        let everything = ActivityFilter::public().with_visibility(Visibility::All);
        assert_eq!(repo.query(&everything, 0, 10).unwrap().total, 3);

        let future = ActivityFilter::public().created_after(Utc::now() + Duration::hours(1));
        assert_eq!(repo.query(&future, 0, 10).unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_query_scope_matches_types_or_subjects() {
        let (repo, _dir) = create_test_repository().await;
        repo.append(event(2, ActionType::StartupCreated, SubjectRef::Startup(1), true))
            .await
            .unwrap();
        repo.append(event(3, ActionType::StartupUpdated, SubjectRef::Startup(7), true))
            .await
            .unwrap();
        repo.append(event(3, ActionType::StartupUpdated, SubjectRef::Startup(8), true))
            .await
            .unwrap();
        repo.append(event(3, ActionType::StartupSaved, SubjectRef::Opportunity(7), true))
            .await
            .unwrap();
        repo.append(event(1, ActionType::StartupCreated, SubjectRef::Startup(9), true))
            .await
            .unwrap();

        let filter = ActivityFilter::public()
            .excluding_actor(1)
            .within(ActivityScope {
                action_types: vec![ActionType::StartupCreated],
                subjects: vec![SubjectRef::Startup(7), SubjectRef::User(4)],
            });
        let page = repo.query(&filter, 0, 10).unwrap();

        let subjects: Vec<SubjectRef> = page.events.iter().map(|e| e.subject).collect();
        assert_eq!(subjects, vec![SubjectRef::Startup(7), SubjectRef::Startup(1)]);
        assert_eq!(page.total, 2);
    }
}
