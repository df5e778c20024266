//! Read path: blended recommendations, suggestion lists and confidence.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AdaptiveEstimator;
use crate::context::Context;
use crate::profile::ActivityProfile;
use crate::strategies::Strategy;

/// Suggestions at or below this confidence are dropped.
pub const MIN_SUGGESTION_CONFIDENCE: f64 = 0.3;
/// Minutes taken off the recommendation for the quick option.
pub const QUICK_OFFSET: f64 = 5.0;
/// Minutes added to the recommendation for the extended option.
pub const EXTENDED_OFFSET: f64 = 10.0;

/// One strategy's contribution to a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyEstimate {
    pub strategy: Strategy,
    pub weight: f64,
    pub minutes: f64,
}

/// Breakdown of how a recommendation was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub activity_id: String,
    pub context: Context,
    pub estimates: Vec<StrategyEstimate>,
    /// Weighted sum of the strategy estimates.
    pub blended: f64,
    /// Product of the learned context multipliers.
    pub learned_multiplier: f64,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    Quick,
    Recommended,
    Extended,
}

impl SuggestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestionKind::Quick => "Quick",
            SuggestionKind::Recommended => "Recommended",
            SuggestionKind::Extended => "Extended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub duration: u32,
    pub label: String,
    pub confidence: f64,
}

fn to_minutes(value: f64) -> u32 {
    if value.is_finite() {
        value.round().max(0.0) as u32
    } else {
        0
    }
}

impl AdaptiveEstimator {
    /// Recommended duration in whole minutes.
    ///
    /// Unknown activities get the configured fallback. With the estimator
    /// disabled, the rounded baseline is returned without blending.
    pub fn get_optimal_duration(
        &self,
        activity_id: &str,
        context: impl Into<Option<Context>>,
    ) -> u32 {
        let fallback = self.config.fallback_duration;
        if !self.config.enabled {
            return self
                .profiles
                .get(activity_id)
                .map_or(fallback, |p| to_minutes(p.base_duration));
        }

        let context = self.context_or_now(context.into());
        match self.profiles.get(activity_id) {
            Some(profile) => self.blend(profile, &context).duration,
            None => {
                warn!(activity = activity_id, fallback, "unknown activity, using fallback duration");
                fallback
            }
        }
    }

    /// Full breakdown of the recommendation for a known activity.
    pub fn explain(
        &self,
        activity_id: &str,
        context: impl Into<Option<Context>>,
    ) -> Option<Recommendation> {
        let profile = self.profiles.get(activity_id)?;
        let context = self.context_or_now(context.into());
        Some(self.blend(profile, &context))
    }

    fn blend(&self, profile: &ActivityProfile, context: &Context) -> Recommendation {
        let estimates: Vec<StrategyEstimate> = Strategy::ALL
            .iter()
            .map(|strategy| StrategyEstimate {
                strategy: *strategy,
                weight: strategy.weight(),
                minutes: strategy.estimate(profile, context),
            })
            .collect();

        let blended: f64 = estimates.iter().map(|e| e.weight * e.minutes).sum();
        let learned_multiplier = self.multipliers.product(context, &profile.activity_id);
        let adjusted = profile.clamp_duration(blended * learned_multiplier);

        Recommendation {
            activity_id: profile.activity_id.clone(),
            context: *context,
            estimates,
            blended,
            learned_multiplier,
            duration: to_minutes(adjusted),
        }
    }

    /// Quick / recommended / extended options, minus any whose confidence is
    /// at or below the cut-off. Order is always quick, recommended, extended.
    pub fn get_suggested_durations(
        &self,
        activity_id: &str,
        context: impl Into<Option<Context>>,
    ) -> Vec<Suggestion> {
        let context = self.context_or_now(context.into());
        let recommended = f64::from(self.get_optimal_duration(activity_id, context));
        let (min, max) = self
            .profiles
            .get(activity_id)
            .map_or((1.0, f64::INFINITY), |p| (p.min_duration, p.max_duration));

        let confidence = self.confidence(activity_id, &context);
        [
            (SuggestionKind::Quick, (recommended - QUICK_OFFSET).max(min)),
            (SuggestionKind::Recommended, recommended),
            (SuggestionKind::Extended, (recommended + EXTENDED_OFFSET).min(max)),
        ]
        .into_iter()
        .map(|(kind, minutes)| Suggestion {
            kind,
            duration: to_minutes(minutes),
            label: kind.label().to_string(),
            confidence,
        })
        .filter(|s| s.confidence > MIN_SUGGESTION_CONFIDENCE)
        .collect()
    }

    /// Confidence in a recommendation for `activity_id` under `context`,
    /// in `[0, 1]`.
    pub fn confidence(&self, activity_id: &str, context: &Context) -> f64 {
        let time_score = self
            .multipliers
            .time_factor(context.time_of_day, activity_id)
            .min(1.0)
            - 0.5;
        let mood_score = self
            .multipliers
            .mood_factor(context.user_mood, activity_id)
            .min(1.0)
            - 0.5;
        let success_score = self
            .profiles
            .get(activity_id)
            .and_then(ActivityProfile::success_rate)
            .map_or(0.0, |rate| rate - 0.5);
        let pattern_score = success_score;

        let raw = 0.5
            + 0.3 * time_score
            + 0.25 * mood_score
            + 0.25 * pattern_score
            + 0.2 * success_score;
        raw.clamp(0.0, 1.0)
    }
}
