//! Activities module - append-only log of user actions.

mod activities_model;
mod activities_service;
mod activities_traits;


pub use activities_model::{
    ActionType, ActivityEvent, ActivityFilter, ActivityPage, ActivityScope, NewActivityEvent,
    SubjectKind, SubjectRef, Visibility, MAX_DESCRIPTION_LEN,
};
pub use activities_service::ActivityService;
pub use activities_traits::{ActivityRepositoryTrait, ActivityServiceTrait};
