use std::time::Duration;

/// Feed pages stay cached for five minutes.
pub const FEED_CACHE_TTL: Duration = Duration::from_secs(300);

/// Recommendation lists stay cached for thirty minutes.
pub const RECOMMENDATIONS_CACHE_TTL: Duration = Duration::from_secs(1800);

/// Two tasks sharing a dedup key within this window collapse into one effect.
pub const TASK_DEDUP_WINDOW: Duration = Duration::from_secs(5);

/// Upper bound on how long `TaskQueue::stop` waits for the backlog to drain.
pub const TASK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bounded capacity of a task queue channel.
pub const TASK_QUEUE_CAPACITY: usize = 1024;

/// Default feed page size.
pub const DEFAULT_FEED_PAGE_SIZE: usize = 10;

/// Largest feed page a caller may request.
pub const MAX_FEED_PAGE_SIZE: usize = 50;

/// Saved or followed entities whose events are pulled into a user's feed.
pub const MAX_FEED_INTEREST_SUBJECTS: usize = 200;

/// Default number of recommendations returned.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// Largest recommendation list a caller may request.
pub const MAX_RECOMMENDATION_LIMIT: usize = 20;

/// Candidates younger than this receive a recency boost.
pub const RECENCY_WINDOW_DAYS: i64 = 7;

/// Boost added to the score of a candidate created inside the recency window.
pub const RECENCY_BOOST: f64 = 3.0;

/// Investors only see startups that were active within this window.
pub const INVESTOR_ACTIVITY_WINDOW_DAYS: i64 = 30;

/// Window of the acting user's own events used for category affinity.
pub const AFFINITY_WINDOW_DAYS: i64 = 30;

/// Maximum number of the acting user's events inspected for category affinity.
pub const AFFINITY_EVENT_LIMIT: usize = 200;

/// Maximum number of candidates fetched per recommendation computation.
pub const MAX_CANDIDATES: usize = 200;

/// Default per-operation timeout against the distributed cache.
pub const CACHE_OP_TIMEOUT: Duration = Duration::from_millis(250);

/// Default capacity of the in-process cache.
pub const LOCAL_CACHE_CAPACITY: u64 = 10_000;
