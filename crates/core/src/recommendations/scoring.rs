//! Candidate scoring strategies and deterministic ranking.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::constants::{RECENCY_BOOST, RECENCY_WINDOW_DAYS};
use crate::directory::{Candidate, UserProfile};

/// Per-request inputs shared by every candidate score.
pub struct ScoringContext<'a> {
    pub user: &'a UserProfile,
    pub now: DateTime<Utc>,
    /// Lower-cased category -> number of the user's recent events touching it.
    pub category_affinity: &'a HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: f64,
    pub reason: String,
}

/// Pluggable scoring strategy.
pub trait Scorer: Send + Sync {
    fn score(&self, candidate: &Candidate, ctx: &ScoringContext<'_>) -> Score;
}

#[derive(Clone, Debug)]
pub struct RuleBasedWeights {
    pub followed: f64,
    pub saved: f64,
    pub category_affinity: f64,
    pub recency_boost: f64,
    pub recency_window: Duration,
}

impl Default for RuleBasedWeights {
    fn default() -> Self {
        Self {
            followed: 2.0,
            saved: 1.0,
            category_affinity: 1.0,
            recency_boost: RECENCY_BOOST,
            recency_window: Duration::days(RECENCY_WINDOW_DAYS),
        }
    }
}

/// `2*followed + 1*saved + affinity + recency boost`.
#[derive(Clone, Debug, Default)]
pub struct RuleBasedScorer {
    weights: RuleBasedWeights,
}

impl RuleBasedScorer {
    pub fn new(weights: RuleBasedWeights) -> Self {
        Self { weights }
    }
}

impl Scorer for RuleBasedScorer {
    fn score(&self, candidate: &Candidate, ctx: &ScoringContext<'_>) -> Score {
        let w = &self.weights;

        let affinity = candidate
            .category
            .as_ref()
            .and_then(|c| ctx.category_affinity.get(&c.trim().to_lowercase()))
            .copied()
            .unwrap_or(0);
        let age = ctx.now.signed_duration_since(candidate.created_at);
        let is_recent = age < w.recency_window;

        let value = w.followed * f64::from(candidate.followed_count)
            + w.saved * f64::from(candidate.saved_count)
            + w.category_affinity * affinity as f64
            + if is_recent { w.recency_boost } else { 0.0 };

        let mut reasons = Vec::new();
        if affinity > 0 {
            if let Some(category) = &candidate.category {
                reasons.push(format!("Matches your interest in {}", category));
            }
        }
        let overlap = candidate.tag_overlap(&ctx.user.tags);
        if overlap > 0 {
            reasons.push(format!("Shares {} of your tags", overlap));
        }
        if candidate.followed_count > 0 {
            reasons.push(format!("Followed by {} users", candidate.followed_count));
        }
        if candidate.saved_count > 0 {
            reasons.push(format!("Saved by {} users", candidate.saved_count));
        }
        if is_recent {
            reasons.push("New this week".to_string());
        }
        let reason = if reasons.is_empty() {
            "Trending on CollabHub".to_string()
        } else {
            reasons.join("; ")
        };

        Score { value, reason }
    }
}

/// Score descending, then newest first, then lowest id.
pub fn compare_ranked(a: (&Candidate, f64), b: (&Candidate, f64)) -> Ordering {
    b.1.total_cmp(&a.1)
        .then_with(|| b.0.created_at.cmp(&a.0.created_at))
        .then_with(|| a.0.entity.id().cmp(&b.0.entity.id()))
}
