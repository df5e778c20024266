//! Per-activity duration profiles and their rolling history logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::context::Context;

/// Default number of entries retained per history log.
pub const DEFAULT_HISTORY_CAP: usize = 100;

/// Lifecycle of an entry in the completions log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Started,
    Completed,
}

/// A started or completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub timestamp: DateTime<Utc>,
    pub context: Context,
    /// Planned minutes for `Started`, actual minutes for `Completed`.
    pub duration: f64,
    pub status: SessionStatus,
    #[serde(default)]
    pub satisfaction: Option<f64>,
}

/// A session the user quit early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonmentRecord {
    pub timestamp: DateTime<Utc>,
    pub context: Context,
    pub duration: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// What produced a satisfaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SatisfactionKind {
    Feedback,
    DurationChange,
}

/// Explicit rating or a manual duration change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatisfactionRecord {
    pub timestamp: DateTime<Utc>,
    pub context: Context,
    /// Rated duration, or the new duration for a change.
    pub duration: f64,
    pub kind: SatisfactionKind,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub previous_duration: Option<f64>,
}

/// The three bounded logs kept for each activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    #[serde(default)]
    pub completions: VecDeque<CompletionRecord>,
    #[serde(default)]
    pub abandonments: VecDeque<AbandonmentRecord>,
    #[serde(default)]
    pub satisfaction_events: VecDeque<SatisfactionRecord>,
}

/// `value` limited to `[lo, hi]`; never panics on inverted bounds.
pub(crate) fn bound(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Append `item`, evicting the oldest entries beyond `cap`.
pub(crate) fn push_capped<T>(log: &mut VecDeque<T>, item: T, cap: usize) {
    log.push_back(item);
    truncate_front(log, cap);
}

/// Keep only the newest `keep` entries.
pub(crate) fn truncate_front<T>(log: &mut VecDeque<T>, keep: usize) {
    while log.len() > keep {
        log.pop_front();
    }
}

impl History {
    /// Completed sessions only, oldest first.
    pub fn completed(&self) -> impl DoubleEndedIterator<Item = &CompletionRecord> + '_ {
        self.completions
            .iter()
            .filter(|r| r.status == SessionStatus::Completed)
    }

    pub fn completed_count(&self) -> usize {
        self.completed().count()
    }

    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
            && self.abandonments.is_empty()
            && self.satisfaction_events.is_empty()
    }

    pub fn truncate(&mut self, keep: usize) {
        truncate_front(&mut self.completions, keep);
        truncate_front(&mut self.abandonments, keep);
        truncate_front(&mut self.satisfaction_events, keep);
    }
}

/// Duration configuration and learned baseline for one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityProfile {
    pub activity_id: String,
    pub base_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub learning_rate: f64,
    #[serde(default)]
    pub history: History,
}

impl ActivityProfile {
    /// Create a profile; `base` is clamped into `[min, max]`.
    pub fn new(activity_id: &str, base: f64, min: f64, max: f64, learning_rate: f64) -> Self {
        let mut profile = Self {
            activity_id: activity_id.to_string(),
            base_duration: base,
            min_duration: min,
            max_duration: max,
            learning_rate,
            history: History::default(),
        };
        profile.clamp_base();
        profile
    }

    pub fn clamp_base(&mut self) {
        self.base_duration = bound(self.base_duration, self.min_duration, self.max_duration);
    }

    /// Set the baseline, clamped into bounds.
    pub fn set_base(&mut self, value: f64) {
        if value.is_finite() {
            self.base_duration = value;
        }
        self.clamp_base();
    }

    /// Shift the baseline by `delta`, clamped into bounds.
    pub fn shift_base(&mut self, delta: f64) {
        self.set_base(self.base_duration + delta);
    }

    pub fn clamp_duration(&self, minutes: f64) -> f64 {
        bound(minutes, self.min_duration, self.max_duration)
    }

    /// Whether the configured bounds and rate are usable.
    pub fn is_well_formed(&self) -> bool {
        self.min_duration.is_finite()
            && self.max_duration.is_finite()
            && self.min_duration >= 0.0
            && self.min_duration <= self.max_duration
            && self.learning_rate > 0.0
            && self.learning_rate <= 1.0
            && self.base_duration.is_finite()
    }

    /// Ratio `completed / (completed + abandoned)`, or `None` without history.
    pub fn success_rate(&self) -> Option<f64> {
        let completed = self.history.completed_count();
        let abandoned = self.history.abandonments.len();
        let total = completed + abandoned;
        if total == 0 {
            None
        } else {
            Some(completed as f64 / total as f64)
        }
    }
}

/// The built-in activity set.
pub fn default_profiles() -> BTreeMap<String, ActivityProfile> {
    [
        ActivityProfile::new("meditation", 10.0, 2.0, 60.0, 0.1),
        ActivityProfile::new("journal", 15.0, 5.0, 60.0, 0.1),
        ActivityProfile::new("workout", 20.0, 5.0, 90.0, 0.1),
        ActivityProfile::new("clarity", 10.0, 3.0, 30.0, 0.1),
    ]
    .into_iter()
    .map(|p| (p.activity_id.clone(), p))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TimeOfDay;

    fn completion(minutes: f64, status: SessionStatus) -> CompletionRecord {
        CompletionRecord {
            timestamp: Utc::now(),
            context: Context::neutral(TimeOfDay::Day),
            duration: minutes,
            status,
            satisfaction: None,
        }
    }

    #[test]
    fn new_clamps_base() {
        let p = ActivityProfile::new("x", 100.0, 1.0, 30.0, 0.2);
        assert_eq!(p.base_duration, 30.0);
    }

    #[test]
    fn shift_base_stays_in_bounds() {
        let mut p = ActivityProfile::new("x", 10.0, 5.0, 20.0, 0.1);
        p.shift_base(-50.0);
        assert_eq!(p.base_duration, 5.0);
        p.shift_base(100.0);
        assert_eq!(p.base_duration, 20.0);
        p.shift_base(f64::NAN);
        assert_eq!(p.base_duration, 20.0);
    }

    #[test]
    fn push_capped_evicts_oldest() {
        let mut log = VecDeque::new();
        for i in 0..7 {
            push_capped(&mut log, i, 5);
        }
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn success_rate_ignores_started_entries() {
        let mut p = ActivityProfile::new("x", 10.0, 1.0, 60.0, 0.1);
        assert_eq!(p.success_rate(), None);

        p.history.completions.push_back(completion(10.0, SessionStatus::Started));
        p.history.completions.push_back(completion(10.0, SessionStatus::Completed));
        p.history.abandonments.push_back(AbandonmentRecord {
            timestamp: Utc::now(),
            context: Context::neutral(TimeOfDay::Day),
            duration: 3.0,
            reason: None,
        });
        assert_eq!(p.success_rate(), Some(0.5));
    }

    #[test]
    fn well_formed_checks_bounds_and_rate() {
        assert!(ActivityProfile::new("x", 10.0, 1.0, 60.0, 0.1).is_well_formed());
        let mut bad = ActivityProfile::new("x", 10.0, 1.0, 60.0, 0.1);
        bad.learning_rate = 0.0;
        assert!(!bad.is_well_formed());
        bad.learning_rate = 0.5;
        bad.min_duration = 70.0;
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn default_profiles_cover_builtin_activities() {
        let profiles = default_profiles();
        assert_eq!(profiles.len(), 4);
        let med = &profiles["meditation"];
        assert_eq!(med.base_duration, 10.0);
        assert_eq!(med.min_duration, 2.0);
        assert_eq!(med.max_duration, 60.0);
        assert_eq!(med.learning_rate, 0.1);
    }
}
