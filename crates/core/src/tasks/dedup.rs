use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Tracks when each dedup key was last processed.
///
/// A task is a duplicate when it was enqueued less than `window` after the
/// last *processed* task with the same key. Discarded duplicates do not
/// extend the window. Stale keys are swept lazily, at most once per window.
pub(crate) struct DedupTracker {
    window: Duration,
    last_processed: HashMap<String, Instant>,
    last_sweep: Instant,
}

impl DedupTracker {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            last_processed: HashMap::new(),
            last_sweep: Instant::now(),
        }
    }

    /// Returns true and records the key when the task should run.
    pub(crate) fn admit(&mut self, key: &str, enqueued_at: Instant) -> bool {
        self.sweep(enqueued_at);

        if let Some(previous) = self.last_processed.get(key) {
            if enqueued_at.saturating_duration_since(*previous) < self.window {
                return false;
            }
        }
        self.last_processed.insert(key.to_string(), enqueued_at);
        true
    }

    fn sweep(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_sweep) < self.window {
            return;
        }
        let window = self.window;
        self.last_processed
            .retain(|_, at| now.saturating_duration_since(*at) < window);
        self.last_sweep = now;
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.last_processed.len()
    }
}
