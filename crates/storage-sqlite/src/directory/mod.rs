//! Read-only views of users, startups, opportunities and interactions.
//!
//! These tables are written by the CRUD layer. This crate only reads them.

mod model;
mod repository;

pub use model::{InteractionDB, OpportunityDB, StartupDB, UserDB};
pub use repository::DirectoryRepository;
