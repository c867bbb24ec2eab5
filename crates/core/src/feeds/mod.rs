//! Feeds module - per-user paginated views over the activity log.

mod feeds_model;
mod feeds_service;
mod feeds_traits;


pub use feeds_model::{relevant_action_types, FeedPage, FeedRequest, FeedState};
pub use feeds_service::{FeedConfig, FeedService};
pub use feeds_traits::{FeedRepositoryTrait, FeedServiceTrait};
