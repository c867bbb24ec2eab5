//! Background task queue for side effects of user actions.
//!
//! Each queue owns a bounded channel and a single worker task, so tasks of one
//! queue run strictly in enqueue order. Independent queues may coexist.
//!
//! Lifecycle follows two phases: `new()` creates the channel (tasks enqueued
//! before `start()` are buffered), `start()` spawns the worker and `stop()`
//! closes the channel, drains the backlog for at most `drain_timeout` and
//! discards whatever is left.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::dedup::DedupTracker;
use super::tasks_model::{Notification, Task, TaskPayload};
use super::tasks_traits::{ActivityObserver, NotificationSink};
use crate::activities::{ActivityServiceTrait, NewActivityEvent};
use crate::constants::{TASK_DEDUP_WINDOW, TASK_DRAIN_TIMEOUT, TASK_QUEUE_CAPACITY};
use crate::errors::Result;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskQueueError {
    #[error("Task queue '{name}' is full ({capacity} tasks), task dropped")]
    Full { name: String, capacity: usize },

    #[error("Task queue '{0}' is stopped")]
    Closed(String),

    #[error("Task queue '{0}' is already running")]
    AlreadyStarted(String),
}

#[derive(Clone, Debug)]
pub struct TaskQueueConfig {
    /// Name used in logs.
    pub name: String,
    pub capacity: usize,
    pub dedup_window: Duration,
    pub drain_timeout: Duration,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            capacity: TASK_QUEUE_CAPACITY,
            dedup_window: TASK_DEDUP_WINDOW,
            drain_timeout: TASK_DRAIN_TIMEOUT,
        }
    }
}

/// Dependencies used by the worker to execute tasks.
pub struct TaskQueueDeps {
    pub activity_service: Arc<dyn ActivityServiceTrait>,
    pub notifier: Arc<dyn NotificationSink>,
    pub observers: Vec<Arc<dyn ActivityObserver>>,
}

pub struct TaskQueue {
    config: TaskQueueConfig,
    tx: Mutex<Option<mpsc::Sender<Task>>>,
    rx: Mutex<Option<mpsc::Receiver<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    deps: Arc<TaskQueueDeps>,
    pending: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TaskQueue {
    pub fn new(config: TaskQueueConfig, deps: TaskQueueDeps) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        Self {
            config,
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            worker: Mutex::new(None),
            deps: Arc::new(deps),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Number of tasks accepted but not yet picked up by the worker.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Queues a task without blocking. When the channel is full the new task
    /// is dropped and `TaskQueueError::Full` is returned.
    pub fn enqueue(&self, payload: TaskPayload) -> std::result::Result<(), TaskQueueError> {
        let task = Task {
            dedup_key: payload.dedup_key(),
            enqueued_at: Instant::now(),
            payload,
        };
        let guard = lock(&self.tx);
        let tx = guard
            .as_ref()
            .ok_or_else(|| TaskQueueError::Closed(self.config.name.clone()))?;

        // Count before sending so the worker never observes a negative backlog.
        self.pending.fetch_add(1, Ordering::SeqCst);
        match tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(task)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                warn!(
                    "Task queue '{}' is full, dropping task {}",
                    self.config.name, task
                );
                Err(TaskQueueError::Full {
                    name: self.config.name.clone(),
                    capacity: self.config.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(TaskQueueError::Closed(self.config.name.clone()))
            }
        }
    }

    pub fn enqueue_activity(
        &self,
        new_event: NewActivityEvent,
    ) -> std::result::Result<(), TaskQueueError> {
        self.enqueue(TaskPayload::LogActivity(new_event))
    }

    pub fn enqueue_notification(
        &self,
        notification: Notification,
    ) -> std::result::Result<(), TaskQueueError> {
        self.enqueue(TaskPayload::Notify(notification))
    }

    /// Spawns the worker. Must be called from within a Tokio runtime.
    pub fn start(&self) -> std::result::Result<(), TaskQueueError> {
        let rx = lock(&self.rx).take().ok_or_else(|| {
            if lock(&self.tx).is_none() {
                TaskQueueError::Closed(self.config.name.clone())
            } else {
                TaskQueueError::AlreadyStarted(self.config.name.clone())
            }
        })?;

        let handle = tokio::spawn(run_worker(
            self.config.name.clone(),
            rx,
            self.deps.clone(),
            self.config.dedup_window,
            self.pending.clone(),
        ));
        *lock(&self.worker) = Some(handle);
        info!("Task queue '{}' started", self.config.name);
        Ok(())
    }

    /// Stops accepting tasks and waits up to `drain_timeout` for the backlog.
    /// Remaining tasks are discarded with a warning.
    pub async fn stop(&self) {
        let sender = lock(&self.tx).take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        if let Some(mut rx) = lock(&self.rx).take() {
            // Never started: nothing will drain the buffer.
            let mut discarded = 0usize;
            while rx.try_recv().is_ok() {
                discarded += 1;
            }
            self.pending.store(0, Ordering::SeqCst);
            if discarded > 0 {
                warn!(
                    "Task queue '{}' stopped before starting, discarded {} task(s)",
                    self.config.name, discarded
                );
            }
            return;
        }

        let handle = lock(&self.worker).take();
        let Some(mut handle) = handle else {
            return;
        };

        match tokio::time::timeout(self.config.drain_timeout, &mut handle).await {
            Ok(_) => info!("Task queue '{}' drained and stopped", self.config.name),
            Err(_) => {
                handle.abort();
                let discarded = self.pending.swap(0, Ordering::SeqCst);
                warn!(
                    "Task queue '{}' did not drain within {:?}, discarded {} task(s)",
                    self.config.name, self.config.drain_timeout, discarded
                );
            }
        }
    }
}

async fn run_worker(
    name: String,
    mut rx: mpsc::Receiver<Task>,
    deps: Arc<TaskQueueDeps>,
    dedup_window: Duration,
    pending: Arc<AtomicUsize>,
) {
    debug!("Task queue '{}' worker running", name);
    let mut dedup = DedupTracker::new(dedup_window);

    while let Some(task) = rx.recv().await {
        pending.fetch_sub(1, Ordering::SeqCst);

        if !dedup.admit(&task.dedup_key, task.enqueued_at) {
            debug!("Task queue '{}' skipped duplicate {}", name, task);
            continue;
        }

        let outcome = AssertUnwindSafe(execute(&deps, &task.payload))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => debug!("Task queue '{}' completed {}", name, task),
            Ok(Err(e)) => error!(
                "Task queue '{}' task {} failed: {}. Payload: {:?}",
                name, task, e, task.payload
            ),
            Err(_) => error!(
                "Task queue '{}' task {} panicked. Payload: {:?}",
                name, task, task.payload
            ),
        }
    }

    debug!("Task queue '{}' worker exiting", name);
}

async fn execute(deps: &TaskQueueDeps, payload: &TaskPayload) -> Result<()> {
    match payload {
        TaskPayload::LogActivity(new_event) => {
            let event = deps.activity_service.append(new_event.clone()).await?;
            for observer in &deps.observers {
                observer.on_activity_logged(&event).await;
            }
            Ok(())
        }
        TaskPayload::Notify(notification) => deps.notifier.notify(notification).await,
    }
}
