//! Actions module - entry point for domain actions reported by the CRUD layer.

mod action_dispatcher;

pub use action_dispatcher::{ActionDispatcher, ActionReceipt, ActionRequest};
