pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod notifications;
mod main_lib;

pub use main_lib::{AppState, build_state, init_tracing};
