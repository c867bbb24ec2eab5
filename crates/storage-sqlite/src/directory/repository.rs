use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

use collabhub_core::activities::{SubjectKind, SubjectRef};
use collabhub_core::directory::{
    Candidate, CandidateProviderTrait, CandidateQuery, InteractionProviderTrait,
    UserDirectoryTrait, UserInteractions, UserProfile,
};
use collabhub_core::recommendations::RecommendationKind;
use collabhub_core::Result;

use super::model::{InteractionDB, OpportunityDB, StartupDB, UserDB};
use crate::db::get_connection;
use crate::errors::StorageError;
use crate::schema::{opportunities, startups, user_interactions, users};
use crate::utils::{chunk_for_sqlite, format_timestamp};

/// Read access to the tables owned by the CRUD layer.
pub struct DirectoryRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl DirectoryRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn load_startups(&self, query: &CandidateQuery, limit: i64) -> Result<Vec<Candidate>> {
        let mut conn = get_connection(&self.pool)?;
        let mut q = startups::table.into_boxed();
        if let Some(since) = query.active_since {
            q = q.filter(startups::updated_at.ge(format_timestamp(since)));
        }
        let rows = q
            .order((
                startups::followed_count.desc(),
                startups::saved_count.desc(),
                startups::id.asc(),
            ))
            .limit(limit)
            .select(StartupDB::as_select())
            .load::<StartupDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(Candidate::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn load_opportunities(&self, query: &CandidateQuery, limit: i64) -> Result<Vec<Candidate>> {
        let mut conn = get_connection(&self.pool)?;
        let mut q = opportunities::table.into_boxed();
        if let Some(since) = query.active_since {
            q = q.filter(opportunities::updated_at.ge(format_timestamp(since)));
        }
        let rows = q
            .order((
                opportunities::followed_count.desc(),
                opportunities::saved_count.desc(),
                opportunities::id.asc(),
            ))
            .limit(limit)
            .select(OpportunityDB::as_select())
            .load::<OpportunityDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(Candidate::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn load_talent(&self, query: &CandidateQuery, limit: i64) -> Result<Vec<Candidate>> {
        let mut conn = get_connection(&self.pool)?;
        let mut q = users::table.filter(users::role.eq("talent")).into_boxed();
        if let Some(since) = query.active_since {
            q = q.filter(users::updated_at.ge(format_timestamp(since)));
        }
        let rows = q
            .order((
                users::followed_count.desc(),
                users::saved_count.desc(),
                users::id.asc(),
            ))
            .limit(limit)
            .select(UserDB::as_select())
            .load::<UserDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(UserDB::into_candidate)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl UserDirectoryTrait for DirectoryRepository {
    fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .find(user_id)
            .select(UserDB::as_select())
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(UserDB::into_profile).transpose()?)
    }
}

impl CandidateProviderTrait for DirectoryRepository {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        match query.kind {
            RecommendationKind::Startup => self.load_startups(query, limit),
            RecommendationKind::Opportunity => self.load_opportunities(query, limit),
            RecommendationKind::Talent => self.load_talent(query, limit),
        }
    }

    fn categories_of(&self, subjects: &[SubjectRef]) -> Result<HashMap<SubjectRef, String>> {
        let mut by_kind: HashMap<SubjectKind, Vec<i64>> = HashMap::new();
        for subject in subjects {
            by_kind.entry(subject.kind()).or_default().push(subject.id());
        }

        let mut conn = get_connection(&self.pool)?;
        let mut categories = HashMap::new();
        for (kind, ids) in by_kind {
            for chunk in chunk_for_sqlite(&ids) {
                let rows: Vec<(i64, Option<String>)> = match kind {
                    SubjectKind::Startup => startups::table
                        .filter(startups::id.eq_any(chunk))
                        .select((startups::id, startups::industry))
                        .load::<(i64, Option<String>)>(&mut conn),
                    SubjectKind::Opportunity => opportunities::table
                        .filter(opportunities::id.eq_any(chunk))
                        .select((opportunities::id, opportunities::industry))
                        .load::<(i64, Option<String>)>(&mut conn),
                    SubjectKind::User => users::table
                        .filter(users::id.eq_any(chunk))
                        .select((users::id, users::discipline))
                        .load::<(i64, Option<String>)>(&mut conn),
                    SubjectKind::Application => Ok(Vec::new()),
                }
                .map_err(StorageError::from)?;

                categories.extend(
                    rows.into_iter()
                        .filter_map(|(id, category)| {
                            category.map(|c| (SubjectRef::new(kind, id), c))
                        }),
                );
            }
        }
        Ok(categories)
    }
}

impl InteractionProviderTrait for DirectoryRepository {
    fn interactions(&self, user_id: i64) -> Result<UserInteractions> {
        let mut conn = get_connection(&self.pool)?;
        let rows = user_interactions::table
            .filter(user_interactions::user_id.eq(user_id))
            .select(InteractionDB::as_select())
            .load::<InteractionDB>(&mut conn)
            .map_err(StorageError::from)?;

        let mut result = UserInteractions::default();
        for row in rows {
            let kind: SubjectKind = match row.subject_kind.parse() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("Skipping interaction of user {}: {}", user_id, e);
                    continue;
                }
            };
            let entity = SubjectRef::new(kind, row.subject_id);
            match row.interaction.as_str() {
                "saved" => result.saved.insert(entity),
                "followed" => result.followed.insert(entity),
                "applied" => result.applied.insert(entity),
                other => {
                    warn!(
                        "Skipping unknown interaction '{}' of user {}",
                        other, user_id
                    );
                    continue;
                }
            };
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};
    use chrono::{Duration, Utc};
    use collabhub_core::directory::UserRole;
    use tempfile::tempdir;

    fn create_test_repository() -> (DirectoryRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        (DirectoryRepository::new(pool), temp_dir)
    }

    fn exec(repo: &DirectoryRepository, sql: &str) {
        let mut conn = get_connection(&repo.pool).expect("Failed to get connection");
        diesel::sql_query(sql)
            .execute(&mut conn)
            .expect("Failed to seed test data");
    }

    fn days_ago(days: i64) -> String {
        format_timestamp(Utc::now() - Duration::days(days))
    }

    fn seed(repo: &DirectoryRepository) {
        let recent = days_ago(2);
        let old = days_ago(60);
        exec(
            repo,
            &format!(
                "INSERT INTO users (id, name, role, tags, discipline, followed_count, saved_count, created_at, updated_at) VALUES \
                 (1, 'Ada', 'talent', 'Python, React', 'Engineering', 3, 0, '{old}', '{recent}'), \
                 (2, 'Bo', 'founder', '', NULL, 0, 0, '{old}', '{old}'), \
                 (3, 'Cy', 'talent', 'Go', 'Design', 9, 1, '{old}', '{old}')"
            ),
        );
        exec(
            repo,
            &format!(
                "INSERT INTO startups (id, owner_id, name, industry, funding_stage, tags, followed_count, saved_count, created_at, updated_at) VALUES \
                 (10, 2, 'Acme', 'Fintech', 'seed', 'python', 5, 1, '{recent}', '{recent}'), \
                 (11, 2, 'Globex', NULL, NULL, '', 8, 0, '{old}', '{old}')"
            ),
        );
        exec(
            repo,
            &format!(
                "INSERT INTO opportunities (id, startup_id, owner_id, title, industry, tags, followed_count, saved_count, created_at, updated_at) VALUES \
                 (20, 10, 2, 'Backend engineer', 'Fintech', 'rust', 0, 4, '{recent}', '{recent}')"
            ),
        );
        exec(
            repo,
            &format!(
                "INSERT INTO user_interactions (user_id, subject_kind, subject_id, interaction, created_at) VALUES \
                 (1, 'startup', 10, 'saved', '{recent}'), \
                 (1, 'startup', 10, 'followed', '{recent}'), \
                 (1, 'opportunity', 20, 'applied', '{recent}')"
            ),
        );
    }

    #[test]
    fn test_get_user() {
        let (repo, _dir) = create_test_repository();
        seed(&repo);

        let user = repo.get_user(1).unwrap().unwrap();
        assert_eq!(user.role, UserRole::Talent);
        assert_eq!(user.tags, vec!["Python", "React"]);
        assert_eq!(repo.get_user(99).unwrap(), None);
    }

    #[test]
    fn test_candidates_by_kind_and_activity() {
        let (repo, _dir) = create_test_repository();
        seed(&repo);

        let all = repo
            .candidates(&CandidateQuery {
                kind: RecommendationKind::Startup,
                active_since: None,
                limit: 10,
            })
            .unwrap();
        let ids: Vec<SubjectRef> = all.iter().map(|c| c.entity).collect();
        assert_eq!(ids, vec![SubjectRef::Startup(11), SubjectRef::Startup(10)]);
        assert_eq!(all[1].owner_id, Some(2));
        assert_eq!(all[1].category.as_deref(), Some("Fintech"));

        let active = repo
            .candidates(&CandidateQuery {
                kind: RecommendationKind::Startup,
                active_since: Some(Utc::now() - Duration::days(30)),
                limit: 10,
            })
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].entity, SubjectRef::Startup(10));

        let talent = repo
            .candidates(&CandidateQuery {
                kind: RecommendationKind::Talent,
                active_since: None,
                limit: 1,
            })
            .unwrap();
        assert_eq!(talent.len(), 1);
        assert_eq!(talent[0].entity, SubjectRef::User(3));
    }

    #[test]
    fn test_categories_of_mixed_subjects() {
        let (repo, _dir) = create_test_repository();
        seed(&repo);

        let categories = repo
            .categories_of(&[
                SubjectRef::Startup(10),
                SubjectRef::Startup(11),
                SubjectRef::Opportunity(20),
                SubjectRef::User(3),
                SubjectRef::Application(1),
            ])
            .unwrap();

        assert_eq!(categories.len(), 3);
        assert_eq!(categories[&SubjectRef::Startup(10)], "Fintech");
        assert_eq!(categories[&SubjectRef::User(3)], "Design");
    }

    #[test]
    fn test_interactions() {
        let (repo, _dir) = create_test_repository();
        seed(&repo);

        let interactions = repo.interactions(1).unwrap();
        assert!(interactions.saved.contains(&SubjectRef::Startup(10)));
        assert!(interactions.followed.contains(&SubjectRef::Startup(10)));
        assert!(interactions.contains(&SubjectRef::Opportunity(20)));
        assert!(!interactions.contains(&SubjectRef::Startup(11)));
        assert_eq!(repo.interactions(2).unwrap(), UserInteractions::default());
    }
}
