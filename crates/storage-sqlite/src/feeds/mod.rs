//! Per-user feed cursor storage.

mod model;
mod repository;

pub use model::FeedStateDB;
pub use repository::FeedRepository;
