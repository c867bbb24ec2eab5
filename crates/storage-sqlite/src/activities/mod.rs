//! Append-only activity event storage.

mod model;
mod repository;

pub use model::{ActivityEventDB, NewActivityEventDB};
pub use repository::ActivityRepository;
