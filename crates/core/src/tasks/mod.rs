//! Tasks module - asynchronous activity logging and notification dispatch.

mod dedup;
mod task_queue;
mod tasks_model;
mod tasks_traits;


pub use task_queue::{TaskQueue, TaskQueueConfig, TaskQueueDeps, TaskQueueError};
pub use tasks_model::{
    activity_dedup_key, notification_dedup_key, Notification, NotificationType, Task, TaskPayload,
};
pub use tasks_traits::{ActivityObserver, LogNotificationSink, NotificationSink};
