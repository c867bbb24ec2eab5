use std::{net::SocketAddr, str::FromStr, time::Duration};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub redis_url: Option<String>,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub notify_webhook_url: Option<String>,
    pub task_queue_capacity: usize,
    pub task_dedup_window: Duration,
    pub task_drain_timeout: Duration,
    pub feed_ttl: Duration,
    pub recommendations_ttl: Duration,
    pub cache_op_timeout: Duration,
    pub local_cache_capacity: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr = parsed("CH_LISTEN_ADDR", || SocketAddr::from(([0, 0, 0, 0], 8080)));
        let db_path = std::env::var("CH_DB_PATH").unwrap_or_else(|_| "./db/collabhub.db".into());
        let cors_allow = std::env::var("CH_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            listen_addr,
            db_path,
            redis_url: optional("CH_REDIS_URL"),
            cors_allow,
            request_timeout: Duration::from_millis(parsed("CH_REQUEST_TIMEOUT_MS", || 30_000)),
            notify_webhook_url: optional("CH_NOTIFY_WEBHOOK_URL"),
            task_queue_capacity: parsed("CH_TASK_QUEUE_CAPACITY", || 1024),
            task_dedup_window: Duration::from_millis(parsed("CH_TASK_DEDUP_WINDOW_MS", || 5_000)),
            task_drain_timeout: Duration::from_millis(parsed("CH_TASK_DRAIN_TIMEOUT_MS", || 5_000)),
            feed_ttl: Duration::from_secs(parsed("CH_FEED_TTL_SECS", || 300)),
            recommendations_ttl: Duration::from_secs(parsed("CH_RECS_TTL_SECS", || 1_800)),
            cache_op_timeout: Duration::from_millis(parsed("CH_CACHE_OP_TIMEOUT_MS", || 250)),
            local_cache_capacity: parsed("CH_LOCAL_CACHE_CAPACITY", || 10_000),
        }
    }
}

/// Unset or blank values are treated as absent.
fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `key`, falling back to `default` when unset or malformed.
fn parsed<T: FromStr>(key: &str, default: impl FnOnce() -> T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            eprintln!("Ignoring invalid {}={:?}, using default", key, raw);
            default()
        }),
        Err(_) => default(),
    }
}
