//! Recommendations module - scoring, ranking and caching of suggestions.

mod recommendations_model;
mod recommendations_service;
mod recommendations_traits;
mod scoring;


pub use recommendations_model::{
    RecommendationItem, RecommendationKind, Recommendations,
};
pub use recommendations_service::{
    RecommendationConfig, RecommendationDeps, RecommendationService,
};
pub use recommendations_traits::RecommendationServiceTrait;
pub use scoring::{
    compare_ranked, RuleBasedScorer, RuleBasedWeights, Score, Scorer, ScoringContext,
};
