//! Write path: outcome events and the online baseline/multiplier updates.
//!
//! Every handler validates its input first and leaves the state untouched
//! on rejection. Accepted events are appended to the activity's history and
//! to the preference log, optionally adjust the baseline and multipliers,
//! and are persisted.

use chrono::Utc;
use tracing::{debug, warn};

use super::AdaptiveEstimator;
use crate::context::Context;
use crate::error::ValidationError;
use crate::events::OutcomeEvent;
use crate::multipliers::{PENALTY_FACTOR, REWARD_FACTOR};
use crate::preferences::{PreferenceAction, PreferenceEntry};
use crate::profile::{
    push_capped, AbandonmentRecord, ActivityProfile, CompletionRecord, SatisfactionKind,
    SatisfactionRecord, SessionStatus,
};
use crate::strategies::NEUTRAL_RATING;

/// Lowest accepted rating.
pub const RATING_MIN: f64 = 0.0;
/// Highest accepted rating.
pub const RATING_MAX: f64 = 10.0;

const ABANDON_STRENGTH: f64 = 0.5;
const DURATION_CHANGE_STRENGTH: f64 = 0.3;
const FEEDBACK_STRENGTH: f64 = 0.2;

fn check_duration(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidDuration {
            field: field.to_string(),
            value,
        })
    }
}

fn check_rating(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (RATING_MIN..=RATING_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::RatingOutOfRange {
            value,
            min: RATING_MIN,
            max: RATING_MAX,
        })
    }
}

fn rejected<T>(activity_id: &str, result: Result<T, ValidationError>) -> Result<T, ValidationError> {
    if let Err(e) = &result {
        warn!(activity = activity_id, error = %e, "rejected outcome event");
    }
    result
}

impl AdaptiveEstimator {
    fn known_activity(&self, activity_id: &str) -> Result<(), ValidationError> {
        if activity_id.is_empty() {
            return Err(ValidationError::EmptyActivity);
        }
        if self.profiles.contains_key(activity_id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownActivity(activity_id.to_string()))
        }
    }

    /// Run `update` against the profile, log the preference entry, persist.
    fn apply_event(
        &mut self,
        activity_id: &str,
        action: PreferenceAction,
        duration: f64,
        context: Context,
        update: impl FnOnce(&mut ActivityProfile, usize, bool),
    ) {
        let cap = self.config.history_cap;
        let learning = self.config.learning_enabled;

        if let Some(profile) = self.profiles.get_mut(activity_id) {
            let before = profile.base_duration;
            update(profile, cap, learning);
            if profile.base_duration != before {
                debug!(
                    activity = activity_id,
                    ?action,
                    from = before,
                    to = profile.base_duration,
                    "baseline updated"
                );
            }
        }

        self.preferences.push(
            PreferenceEntry {
                activity_id: activity_id.to_string(),
                action,
                duration,
                context,
                timestamp: Utc::now(),
            },
            self.config.preference_cap,
        );
        self.flush();
    }

    fn adjust_multipliers(&mut self, activity_id: &str, context: &Context, factor: f64) {
        if self.config.learning_enabled {
            let bounds = self.config.multiplier_bounds();
            self.multipliers.adjust(context, activity_id, factor, bounds);
        }
    }

    /// A session was started with a planned duration. History only.
    pub fn record_start(
        &mut self,
        activity_id: &str,
        planned_duration: f64,
        context: impl Into<Option<Context>>,
    ) -> Result<(), ValidationError> {
        let planned = rejected(
            activity_id,
            self.known_activity(activity_id)
                .and_then(|_| check_duration("planned_duration", planned_duration)),
        )?;
        let context = self.context_or_now(context.into());

        self.apply_event(activity_id, PreferenceAction::Started, planned, context, |p, cap, _| {
            push_capped(
                &mut p.history.completions,
                CompletionRecord {
                    timestamp: Utc::now(),
                    context,
                    duration: planned,
                    status: SessionStatus::Started,
                    satisfaction: None,
                },
                cap,
            );
        });
        Ok(())
    }

    /// A session ran to completion. Pulls the baseline toward `actual_duration`
    /// and rewards the context's multipliers.
    pub fn record_complete(
        &mut self,
        activity_id: &str,
        actual_duration: f64,
        satisfaction: Option<f64>,
        context: impl Into<Option<Context>>,
    ) -> Result<(), ValidationError> {
        let (actual, satisfaction) = rejected(
            activity_id,
            self.known_activity(activity_id).and_then(|_| {
                let actual = check_duration("actual_duration", actual_duration)?;
                let satisfaction = satisfaction.map(check_rating).transpose()?;
                Ok((actual, satisfaction))
            }),
        )?;
        let context = self.context_or_now(context.into());
        self.adjust_multipliers(activity_id, &context, REWARD_FACTOR);

        self.apply_event(activity_id, PreferenceAction::Completed, actual, context, |p, cap, learning| {
            push_capped(
                &mut p.history.completions,
                CompletionRecord {
                    timestamp: Utc::now(),
                    context,
                    duration: actual,
                    status: SessionStatus::Completed,
                    satisfaction,
                },
                cap,
            );
            if learning {
                p.shift_base((actual - p.base_duration) * p.learning_rate);
            }
        });
        Ok(())
    }

    /// A session was quit early. Pulls the baseline toward the shorter
    /// duration at half strength and penalizes the context's multipliers.
    pub fn record_abandon(
        &mut self,
        activity_id: &str,
        actual_duration: f64,
        reason: Option<&str>,
        context: impl Into<Option<Context>>,
    ) -> Result<(), ValidationError> {
        let actual = rejected(
            activity_id,
            self.known_activity(activity_id)
                .and_then(|_| check_duration("actual_duration", actual_duration)),
        )?;
        let context = self.context_or_now(context.into());
        let reason = reason.map(str::to_string);
        self.adjust_multipliers(activity_id, &context, PENALTY_FACTOR);

        self.apply_event(activity_id, PreferenceAction::Abandoned, actual, context, |p, cap, learning| {
            push_capped(
                &mut p.history.abandonments,
                AbandonmentRecord {
                    timestamp: Utc::now(),
                    context,
                    duration: actual,
                    reason,
                },
                cap,
            );
            if learning {
                p.shift_base((actual - p.base_duration) * p.learning_rate * ABANDON_STRENGTH);
            }
        });
        Ok(())
    }

    /// The user manually changed a duration.
    pub fn record_duration_change(
        &mut self,
        activity_id: &str,
        old_duration: f64,
        new_duration: f64,
        context: impl Into<Option<Context>>,
    ) -> Result<(), ValidationError> {
        let (old, new) = rejected(
            activity_id,
            self.known_activity(activity_id).and_then(|_| {
                Ok((
                    check_duration("old_duration", old_duration)?,
                    check_duration("new_duration", new_duration)?,
                ))
            }),
        )?;
        let context = self.context_or_now(context.into());

        self.apply_event(
            activity_id,
            PreferenceAction::DurationChanged,
            new,
            context,
            |p, cap, learning| {
                push_capped(
                    &mut p.history.satisfaction_events,
                    SatisfactionRecord {
                        timestamp: Utc::now(),
                        context,
                        duration: new,
                        kind: SatisfactionKind::DurationChange,
                        rating: None,
                        previous_duration: Some(old),
                    },
                    cap,
                );
                if learning {
                    p.shift_base((new - old) * p.learning_rate * DURATION_CHANGE_STRENGTH);
                }
            },
        );
        Ok(())
    }

    /// Explicit rating for a session of `duration` minutes.
    pub fn record_feedback(
        &mut self,
        activity_id: &str,
        duration: f64,
        rating: f64,
        context: impl Into<Option<Context>>,
    ) -> Result<(), ValidationError> {
        let (duration, rating) = rejected(
            activity_id,
            self.known_activity(activity_id).and_then(|_| {
                Ok((check_duration("duration", duration)?, check_rating(rating)?))
            }),
        )?;
        let context = self.context_or_now(context.into());

        self.apply_event(activity_id, PreferenceAction::Feedback, duration, context, |p, cap, learning| {
            push_capped(
                &mut p.history.satisfaction_events,
                SatisfactionRecord {
                    timestamp: Utc::now(),
                    context,
                    duration,
                    kind: SatisfactionKind::Feedback,
                    rating: Some(rating),
                    previous_duration: None,
                },
                cap,
            );
            if learning {
                p.shift_base((rating - NEUTRAL_RATING) * p.learning_rate * FEEDBACK_STRENGTH);
            }
        });
        Ok(())
    }

    /// Dispatch an [`OutcomeEvent`] to the matching `record_*` handler.
    pub fn record(&mut self, event: OutcomeEvent) -> Result<(), ValidationError> {
        match event {
            OutcomeEvent::Started {
                activity_id,
                planned_duration,
                context,
            } => self.record_start(&activity_id, planned_duration, context),
            OutcomeEvent::Completed {
                activity_id,
                actual_duration,
                satisfaction,
                context,
            } => self.record_complete(&activity_id, actual_duration, satisfaction, context),
            OutcomeEvent::Abandoned {
                activity_id,
                actual_duration,
                reason,
                context,
            } => self.record_abandon(&activity_id, actual_duration, reason.as_deref(), context),
            OutcomeEvent::DurationChanged {
                activity_id,
                old_duration,
                new_duration,
                context,
            } => self.record_duration_change(&activity_id, old_duration, new_duration, context),
            OutcomeEvent::Feedback {
                activity_id,
                duration,
                rating,
                context,
            } => self.record_feedback(&activity_id, duration, rating, context),
        }
    }
}
