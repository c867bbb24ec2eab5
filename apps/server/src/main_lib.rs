use std::sync::Arc;

use crate::{config::Config, notifications::WebhookNotificationSink};
use collabhub_cache_redis::RedisCache;
use collabhub_core::{
    actions::ActionDispatcher,
    activities::{ActivityService, ActivityServiceTrait},
    cache::{CacheBackend, LocalCache, ResilientCache, ResilientCacheConfig},
    feeds::{FeedConfig, FeedService, FeedServiceTrait},
    health::{CacheProbe, HealthProbe, HealthService, HealthServiceTrait},
    recommendations::{
        RecommendationConfig, RecommendationDeps, RecommendationService,
        RecommendationServiceTrait, RuleBasedScorer,
    },
    tasks::{
        ActivityObserver, LogNotificationSink, NotificationSink, TaskQueue, TaskQueueConfig,
        TaskQueueDeps,
    },
};
use collabhub_storage_sqlite::{
    activities::ActivityRepository,
    db::{self, spawn_writer},
    directory::DirectoryRepository,
    feeds::FeedRepository,
    health::SqliteHealthProbe,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub feed_service: Arc<dyn FeedServiceTrait>,
    pub recommendation_service: Arc<dyn RecommendationServiceTrait>,
    pub action_dispatcher: Arc<ActionDispatcher>,
    pub task_queue: Arc<TaskQueue>,
    pub health_service: Arc<dyn HealthServiceTrait>,
    pub cache: Arc<ResilientCache>,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let text = std::env::var("CH_LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("text"))
        .unwrap_or(false);
    let registry = tracing_subscriber::registry().with(filter);
    // try_init: tests build several states in one process.
    let _ = if text {
        registry.with(fmt::layer()).try_init()
    } else {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    };
}

async fn build_cache(config: &Config) -> Arc<ResilientCache> {
    let local = LocalCache::with_capacity(config.local_cache_capacity);
    let cache_config = ResilientCacheConfig {
        op_timeout: config.cache_op_timeout,
        ..ResilientCacheConfig::default()
    };

    let primary: Option<Arc<dyn CacheBackend>> = match &config.redis_url {
        Some(url) => match RedisCache::connect(url).await {
            Ok(redis) => Some(Arc::new(redis)),
            Err(e) => {
                tracing::warn!("Redis unavailable at startup, using the local cache only: {}", e);
                None
            }
        },
        None => {
            tracing::info!("CH_REDIS_URL not set, using the local cache only");
            None
        }
    };

    Arc::new(ResilientCache::new(primary, local, cache_config))
}

fn build_notifier(config: &Config) -> anyhow::Result<Arc<dyn NotificationSink>> {
    let sink: Arc<dyn NotificationSink> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!("Delivering notifications to webhook");
            Arc::new(WebhookNotificationSink::new(url.clone())?)
        }
        None => Arc::new(LogNotificationSink),
    };
    Ok(sink)
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let activity_repository = Arc::new(ActivityRepository::new(pool.clone(), writer.clone()));
    let feed_repository = Arc::new(FeedRepository::new(pool.clone(), writer.clone()));
    let directory = Arc::new(DirectoryRepository::new(pool.clone()));

    let cache = build_cache(config).await;
    let cache_backend: Arc<dyn CacheBackend> = cache.clone();

    let activity_service: Arc<dyn ActivityServiceTrait> =
        Arc::new(ActivityService::new(activity_repository));

    let feed_service = Arc::new(FeedService::new(
        activity_service.clone(),
        feed_repository,
        directory.clone(),
        directory.clone(),
        cache_backend.clone(),
        FeedConfig {
            ttl: config.feed_ttl,
            ..FeedConfig::default()
        },
    ));

    let recommendation_service = Arc::new(RecommendationService::new(
        RecommendationDeps {
            users: directory.clone(),
            candidates: directory.clone(),
            interactions: directory,
            activity_service: activity_service.clone(),
            cache: cache_backend,
            scorer: Arc::new(RuleBasedScorer::default()),
        },
        RecommendationConfig {
            ttl: config.recommendations_ttl,
            ..RecommendationConfig::default()
        },
    ));

    let observers: Vec<Arc<dyn ActivityObserver>> =
        vec![feed_service.clone(), recommendation_service.clone()];
    let task_queue = Arc::new(TaskQueue::new(
        TaskQueueConfig {
            name: "activity".to_string(),
            capacity: config.task_queue_capacity,
            dedup_window: config.task_dedup_window,
            drain_timeout: config.task_drain_timeout,
        },
        TaskQueueDeps {
            activity_service,
            notifier: build_notifier(config)?,
            observers,
        },
    ));
    task_queue.start()?;

    let action_dispatcher = Arc::new(ActionDispatcher::new(
        task_queue.clone(),
        recommendation_service.clone(),
    ));

    let probes: Vec<Arc<dyn HealthProbe>> = vec![
        Arc::new(SqliteHealthProbe::new(pool)),
        Arc::new(CacheProbe::new(cache.clone())),
    ];
    let health_service = Arc::new(HealthService::new(probes));

    Ok(Arc::new(AppState {
        feed_service,
        recommendation_service,
        action_dispatcher,
        task_queue,
        health_service,
        cache,
    }))
}
