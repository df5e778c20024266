//! Independent duration estimators.
//!
//! Each strategy is a pure function of an activity profile and a context and
//! falls back to the profile's baseline when it has nothing to go on.

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::multipliers::{default_mood_factor, default_time_factor};
use crate::profile::ActivityProfile;

/// Smoothing factor for [`Strategy::ExponentialSmoothing`].
pub const SMOOTHING_ALPHA: f64 = 0.3;
/// Number of recent completions folded by exponential smoothing.
pub const SMOOTHING_WINDOW: usize = 10;
/// Number of recent satisfaction events read by the feedback strategy.
pub const FEEDBACK_WINDOW: usize = 5;
/// Rating treated as neutral by the feedback strategy.
pub const NEUTRAL_RATING: f64 = 5.0;
/// Minutes of nudge per rating point away from neutral.
pub const FEEDBACK_NUDGE: f64 = 0.2;

/// The blended estimators, in weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    ExponentialSmoothing,
    PatternRecognition,
    ContextualAdjustment,
    UserFeedback,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::ExponentialSmoothing,
        Strategy::PatternRecognition,
        Strategy::ContextualAdjustment,
        Strategy::UserFeedback,
    ];

    /// Blend weight. The weights of [`Strategy::ALL`] sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Strategy::ExponentialSmoothing => 0.30,
            Strategy::PatternRecognition => 0.25,
            Strategy::ContextualAdjustment => 0.25,
            Strategy::UserFeedback => 0.20,
        }
    }

    pub fn estimate(&self, profile: &ActivityProfile, context: &Context) -> f64 {
        let value = match self {
            Strategy::ExponentialSmoothing => exponential_smoothing(profile),
            Strategy::PatternRecognition => pattern_recognition(profile, context),
            Strategy::ContextualAdjustment => contextual_adjustment(profile, context),
            Strategy::UserFeedback => user_feedback(profile),
        };
        if value.is_finite() {
            value
        } else {
            profile.base_duration
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Fold the last ten completions, oldest first, into the baseline.
pub fn exponential_smoothing(profile: &ActivityProfile) -> f64 {
    let recent: Vec<f64> = profile
        .history
        .completed()
        .rev()
        .take(SMOOTHING_WINDOW)
        .map(|r| r.duration)
        .collect();

    recent.iter().rev().fold(profile.base_duration, |smoothed, observed| {
        SMOOTHING_ALPHA * observed + (1.0 - SMOOTHING_ALPHA) * smoothed
    })
}

/// Mean duration of completions recorded under the same time of day and mood.
pub fn pattern_recognition(profile: &ActivityProfile, context: &Context) -> f64 {
    mean(
        profile
            .history
            .completed()
            .filter(|r| r.context.matches_pattern(context))
            .map(|r| r.duration),
    )
    .unwrap_or(profile.base_duration)
}

/// Baseline scaled by the static time-of-day and mood tables.
pub fn contextual_adjustment(profile: &ActivityProfile, context: &Context) -> f64 {
    let activity = profile.activity_id.as_str();
    profile.base_duration
        * default_time_factor(context.time_of_day, activity)
        * default_mood_factor(context.user_mood, activity)
}

/// Mean of the last five satisfaction durations, nudged by their mean rating.
pub fn user_feedback(profile: &ActivityProfile) -> f64 {
    let recent: Vec<_> = profile
        .history
        .satisfaction_events
        .iter()
        .rev()
        .take(FEEDBACK_WINDOW)
        .collect();

    let Some(mean_duration) = mean(recent.iter().map(|e| e.duration)) else {
        return profile.base_duration;
    };
    let mean_rating =
        mean(recent.iter().map(|e| e.rating.unwrap_or(NEUTRAL_RATING))).unwrap_or(NEUTRAL_RATING);

    mean_duration + (mean_rating - NEUTRAL_RATING) * FEEDBACK_NUDGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EnergyLevel, Mood, ScheduleLoad, TimeOfDay};
    use crate::profile::{
        CompletionRecord, SatisfactionKind, SatisfactionRecord, SessionStatus,
    };
    use chrono::Utc;

    fn profile() -> ActivityProfile {
        ActivityProfile::new("meditation", 10.0, 2.0, 60.0, 0.1)
    }

    fn completed(p: &mut ActivityProfile, minutes: f64, context: Context) {
        p.history.completions.push_back(CompletionRecord {
            timestamp: Utc::now(),
            context,
            duration: minutes,
            status: SessionStatus::Completed,
            satisfaction: None,
        });
    }

    fn rated(p: &mut ActivityProfile, minutes: f64, rating: Option<f64>) {
        p.history.satisfaction_events.push_back(SatisfactionRecord {
            timestamp: Utc::now(),
            context: Context::neutral(TimeOfDay::Day),
            duration: minutes,
            kind: SatisfactionKind::Feedback,
            rating,
            previous_duration: None,
        });
    }

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = Strategy::ALL.iter().map(|s| s.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_history_falls_back_to_baseline() {
        let p = profile();
        let ctx = Context::neutral(TimeOfDay::Evening);
        assert_eq!(exponential_smoothing(&p), 10.0);
        assert_eq!(pattern_recognition(&p, &ctx), 10.0);
        assert_eq!(user_feedback(&p), 10.0);
        // evening meditation factor is 1.0, neutral mood 1.0
        assert_eq!(contextual_adjustment(&p, &ctx), 10.0);
    }

    #[test]
    fn smoothing_folds_oldest_first() {
        let mut p = profile();
        let ctx = Context::neutral(TimeOfDay::Day);
        completed(&mut p, 20.0, ctx);
        completed(&mut p, 30.0, ctx);
        // 10 -> 0.3*20 + 0.7*10 = 13 -> 0.3*30 + 0.7*13 = 18.1
        assert!((exponential_smoothing(&p) - 18.1).abs() < 1e-9);
    }

    #[test]
    fn smoothing_uses_only_last_ten() {
        let mut p = profile();
        let ctx = Context::neutral(TimeOfDay::Day);
        completed(&mut p, 59.0, ctx);
        for _ in 0..10 {
            completed(&mut p, 10.0, ctx);
        }
        assert!((exponential_smoothing(&p) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn pattern_requires_time_and_mood_match() {
        let mut p = profile();
        let morning_calm = Context::new(TimeOfDay::Morning, Mood::Calm, EnergyLevel::High, ScheduleLoad::Busy);
        completed(&mut p, 20.0, morning_calm);
        completed(&mut p, 30.0, Context::new(TimeOfDay::Morning, Mood::Calm, EnergyLevel::Low, ScheduleLoad::Free));
        completed(&mut p, 50.0, Context::neutral(TimeOfDay::Morning));

        assert_eq!(pattern_recognition(&p, &morning_calm), 25.0);
        assert_eq!(pattern_recognition(&p, &Context::neutral(TimeOfDay::Night)), 10.0);
    }

    #[test]
    fn contextual_adjustment_uses_static_tables() {
        let p = profile();
        let ctx = Context::new(TimeOfDay::Morning, Mood::Stressed, EnergyLevel::Low, ScheduleLoad::Busy);
        // 10 * 1.2 * 1.4; energy and schedule do not apply here
        assert!((contextual_adjustment(&p, &ctx) - 16.8).abs() < 1e-9);
    }

    #[test]
    fn feedback_nudges_by_rating() {
        let mut p = profile();
        rated(&mut p, 12.0, Some(9.0));
        rated(&mut p, 14.0, None);
        // mean duration 13, mean rating (9 + 5) / 2 = 7 -> 13 + 2 * 0.2
        assert!((user_feedback(&p) - 13.4).abs() < 1e-9);
    }

    #[test]
    fn feedback_reads_last_five() {
        let mut p = profile();
        rated(&mut p, 40.0, Some(1.0));
        for _ in 0..5 {
            rated(&mut p, 10.0, Some(5.0));
        }
        assert_eq!(user_feedback(&p), 10.0);
    }

    #[test]
    fn started_entries_are_not_observations() {
        let mut p = profile();
        p.history.completions.push_back(CompletionRecord {
            timestamp: Utc::now(),
            context: Context::neutral(TimeOfDay::Day),
            duration: 45.0,
            status: SessionStatus::Started,
            satisfaction: None,
        });
        assert_eq!(exponential_smoothing(&p), 10.0);
        assert_eq!(pattern_recognition(&p, &Context::neutral(TimeOfDay::Day)), 10.0);
    }
}
