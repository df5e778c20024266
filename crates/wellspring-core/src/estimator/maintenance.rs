//! Periodic re-estimation and log cleanup.
//!
//! Nothing here is self-scheduled. Hosts call
//! [`AdaptiveEstimator::run_periodic_maintenance`] from their own timer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AdaptiveEstimator;
use crate::multipliers::{PENALTY_FACTOR, REWARD_FACTOR};
use crate::strategies::NEUTRAL_RATING;

/// Minimum log length before a pattern rule fires.
pub const PATTERN_MIN_SAMPLES: usize = 3;
/// Minimum preference entries before re-estimating from them.
pub const PREFERENCE_MIN_SAMPLES: usize = 5;

const COMPLETION_DRIFT_THRESHOLD: f64 = 2.0;
const COMPLETION_DRIFT_RATE: f64 = 0.1;
const ABANDON_MARGIN: f64 = 3.0;
const LOW_SATISFACTION: f64 = 4.0;
const HIGH_SATISFACTION: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineChange {
    pub activity_id: String,
    pub from: f64,
    pub to: f64,
}

/// Outcome of one maintenance run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    pub learning_applied: bool,
    pub baseline_changes: Vec<BaselineChange>,
    pub history_trimmed: usize,
    pub preferences_pruned: usize,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl AdaptiveEstimator {
    fn analyze_one(&mut self, activity_id: &str) -> bool {
        let Some(profile) = self.profiles.get_mut(activity_id) else {
            return false;
        };
        let before = profile.base_duration;

        let completed: Vec<f64> = profile.history.completed().map(|r| r.duration).collect();
        if completed.len() >= PATTERN_MIN_SAMPLES {
            let diff = mean(&completed) - profile.base_duration;
            if diff.abs() > COMPLETION_DRIFT_THRESHOLD {
                profile.shift_base(diff * COMPLETION_DRIFT_RATE);
            }
        }

        let abandoned: Vec<f64> = profile
            .history
            .abandonments
            .iter()
            .map(|r| r.duration)
            .collect();
        if abandoned.len() >= PATTERN_MIN_SAMPLES {
            let quit_point = mean(&abandoned);
            if profile.base_duration - quit_point < ABANDON_MARGIN {
                profile.set_base(quit_point + ABANDON_MARGIN);
            }
        }

        let ratings: Vec<f64> = profile
            .history
            .satisfaction_events
            .iter()
            .map(|e| e.rating.unwrap_or(NEUTRAL_RATING))
            .collect();
        if ratings.len() >= PATTERN_MIN_SAMPLES {
            let rating = mean(&ratings);
            if rating < LOW_SATISFACTION {
                profile.set_base(profile.base_duration * PENALTY_FACTOR);
            } else if rating > HIGH_SATISFACTION {
                profile.set_base(profile.base_duration * REWARD_FACTOR);
            }
        }

        let changed = profile.base_duration != before;
        if changed {
            debug!(
                activity = activity_id,
                from = before,
                to = profile.base_duration,
                "pattern analysis moved baseline"
            );
        }
        changed
    }

    fn learn_one(&mut self, activity_id: &str) -> bool {
        if self.preferences.len(activity_id) < PREFERENCE_MIN_SAMPLES {
            return false;
        }
        let Some(logged) = self.preferences.mean_duration(activity_id) else {
            return false;
        };
        let Some(profile) = self.profiles.get_mut(activity_id) else {
            return false;
        };
        let before = profile.base_duration;
        profile.set_base((profile.base_duration + logged) / 2.0);

        let changed = profile.base_duration != before;
        if changed {
            debug!(
                activity = activity_id,
                from = before,
                to = profile.base_duration,
                "preference log moved baseline"
            );
        }
        changed
    }

    /// Re-estimate an activity's baseline from its history logs.
    ///
    /// Returns whether the baseline moved. A no-op while learning is off.
    pub fn analyze_patterns(&mut self, activity_id: &str) -> bool {
        if !self.config.learning_enabled {
            return false;
        }
        let changed = self.analyze_one(activity_id);
        if changed {
            self.flush();
        }
        changed
    }

    /// Average the baseline with the mean logged preference duration.
    ///
    /// Returns whether the baseline moved. A no-op while learning is off.
    pub fn learn_from_preferences(&mut self, activity_id: &str) -> bool {
        if !self.config.learning_enabled {
            return false;
        }
        let changed = self.learn_one(activity_id);
        if changed {
            self.flush();
        }
        changed
    }

    /// Trim history logs and drop stale preference entries.
    pub fn cleanup(&mut self) {
        self.cleanup_at(Utc::now());
        self.flush();
    }

    /// [`cleanup`](Self::cleanup) against an explicit clock. Returns the
    /// number of history records and preference entries removed.
    pub fn cleanup_at(&mut self, now: DateTime<Utc>) -> (usize, usize) {
        let keep = self.config.cleanup_keep;
        let mut trimmed = 0;
        for profile in self.profiles.values_mut() {
            let history = &mut profile.history;
            let before =
                history.completions.len() + history.abandonments.len() + history.satisfaction_events.len();
            history.truncate(keep);
            let after =
                history.completions.len() + history.abandonments.len() + history.satisfaction_events.len();
            trimmed += before - after;
        }

        let cutoff = now - Duration::days(self.config.preference_max_age_days);
        let pruned = self.preferences.prune_older_than(cutoff);
        self.preferences.truncate(self.config.preference_cap);

        debug!(trimmed, pruned, "cleanup finished");
        (trimmed, pruned)
    }

    /// Pattern analysis and preference learning for every activity, then
    /// cleanup. Learning steps are skipped while learning is off.
    pub fn run_periodic_maintenance(&mut self) -> MaintenanceReport {
        self.run_periodic_maintenance_at(Utc::now())
    }

    pub fn run_periodic_maintenance_at(&mut self, now: DateTime<Utc>) -> MaintenanceReport {
        let mut report = MaintenanceReport {
            learning_applied: self.config.learning_enabled,
            ..Default::default()
        };

        if self.config.learning_enabled {
            let ids: Vec<String> = self.profiles.keys().cloned().collect();
            for id in ids {
                let from = self.profiles[&id].base_duration;
                self.analyze_one(&id);
                self.learn_one(&id);
                let to = self.profiles[&id].base_duration;
                if to != from {
                    report.baseline_changes.push(BaselineChange {
                        activity_id: id,
                        from,
                        to,
                    });
                }
            }
        }

        let (trimmed, pruned) = self.cleanup_at(now);
        report.history_trimmed = trimmed;
        report.preferences_pruned = pruned;

        self.flush();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, TimeOfDay};
    use crate::preferences::{PreferenceAction, PreferenceEntry};
    use crate::storage::{KeyValueStore, MemoryStore, PROFILES_KEY};

    fn ctx() -> Context {
        Context::neutral(TimeOfDay::Day)
    }

    /// Estimator that records history without online learning, so the
    /// maintenance rules are the only thing moving the baseline.
    fn quiet_estimator() -> AdaptiveEstimator {
        let mut est = AdaptiveEstimator::new(Box::new(MemoryStore::new()));
        est.set_learning_enabled(false);
        est
    }

    fn base(est: &AdaptiveEstimator, id: &str) -> f64 {
        est.profile(id).unwrap().base_duration
    }

    #[test]
    fn completions_nudge_baseline() {
        let mut est = quiet_estimator();
        for _ in 0..3 {
            est.record_complete("meditation", 20.0, None, ctx()).unwrap();
        }
        est.set_learning_enabled(true);
        assert!(est.analyze_patterns("meditation"));
        assert!((base(&est, "meditation") - 11.0).abs() < 1e-9);
    }

    #[test]
    fn small_drift_is_ignored() {
        let mut est = quiet_estimator();
        for _ in 0..3 {
            est.record_complete("meditation", 11.5, None, ctx()).unwrap();
        }
        est.set_learning_enabled(true);
        assert!(!est.analyze_patterns("meditation"));
        assert_eq!(base(&est, "meditation"), 10.0);
    }

    #[test]
    fn abandonments_keep_baseline_above_quit_point() {
        let mut est = quiet_estimator();
        for _ in 0..3 {
            est.record_abandon("workout", 18.0, None, ctx()).unwrap();
        }
        est.set_learning_enabled(true);
        est.analyze_patterns("workout");
        assert!((base(&est, "workout") - 21.0).abs() < 1e-9);
    }

    #[test]
    fn low_ratings_shrink_baseline() {
        let mut est = quiet_estimator();
        for _ in 0..3 {
            est.record_feedback("journal", 15.0, 2.0, ctx()).unwrap();
        }
        est.set_learning_enabled(true);
        est.analyze_patterns("journal");
        assert!((base(&est, "journal") - 14.25).abs() < 1e-9);
    }

    #[test]
    fn duration_changes_count_as_neutral_ratings() {
        let mut est = quiet_estimator();
        est.record_feedback("journal", 15.0, 9.0, ctx()).unwrap();
        est.record_feedback("journal", 15.0, 9.0, ctx()).unwrap();
        est.record_duration_change("journal", 15.0, 15.0, ctx()).unwrap();
        est.set_learning_enabled(true);
        est.analyze_patterns("journal");
        // mean rating (9 + 9 + 5) / 3 > 6
        assert!((base(&est, "journal") - 15.75).abs() < 1e-9);
    }

    #[test]
    fn preference_log_averages_into_baseline() {
        let mut est = quiet_estimator();
        for _ in 0..4 {
            est.record_start("journal", 25.0, ctx()).unwrap();
        }
        est.set_learning_enabled(true);
        assert!(!est.learn_from_preferences("journal"));

        est.record_start("journal", 25.0, ctx()).unwrap();
        assert!(est.learn_from_preferences("journal"));
        assert!((base(&est, "journal") - 20.0).abs() < 1e-9);
    }

    #[test]
    fn maintenance_results_stay_in_bounds() {
        let mut est = quiet_estimator();
        for _ in 0..5 {
            est.record_start("clarity", 200.0, ctx()).unwrap();
        }
        est.set_learning_enabled(true);
        est.learn_from_preferences("clarity");
        assert_eq!(base(&est, "clarity"), 30.0);
    }

    #[test]
    fn disabled_learning_skips_rules_but_still_cleans_up() {
        let mut est = quiet_estimator();
        for _ in 0..5 {
            est.record_complete("meditation", 30.0, None, ctx()).unwrap();
        }
        let now = Utc::now();
        est.preferences.push(
            PreferenceEntry {
                activity_id: "meditation".into(),
                action: PreferenceAction::Completed,
                duration: 40.0,
                context: ctx(),
                timestamp: now - Duration::days(45),
            },
            50,
        );

        let report = est.run_periodic_maintenance_at(now);
        assert!(!report.learning_applied);
        assert!(report.baseline_changes.is_empty());
        assert_eq!(report.preferences_pruned, 1);
        assert_eq!(base(&est, "meditation"), 10.0);
        assert!(!est.analyze_patterns("meditation"));
    }

    #[test]
    fn cleanup_trims_history_to_configured_keep() {
        let mut est = quiet_estimator();
        est.config.cleanup_keep = 2;
        for _ in 0..5 {
            est.record_start("workout", 20.0, ctx()).unwrap();
        }
        let (trimmed, pruned) = est.cleanup_at(Utc::now());
        assert_eq!(trimmed, 3);
        assert_eq!(pruned, 0);
        assert_eq!(est.profile("workout").unwrap().history.completions.len(), 2);
    }

    #[test]
    fn periodic_run_reports_and_persists() {
        let store = MemoryStore::new();
        let mut est = AdaptiveEstimator::new(Box::new(store.clone()));
        est.set_learning_enabled(false);
        for _ in 0..3 {
            est.record_complete("meditation", 20.0, None, ctx()).unwrap();
        }
        est.set_learning_enabled(true);

        let report = est.run_periodic_maintenance_at(Utc::now());
        assert!(report.learning_applied);
        let change = report
            .baseline_changes
            .iter()
            .find(|c| c.activity_id == "meditation")
            .unwrap();
        assert_eq!(change.from, 10.0);
        assert!(change.to > 10.0);

        let blob = store.load(PROFILES_KEY).unwrap().unwrap();
        assert_eq!(blob["profiles"]["meditation"]["baseDuration"], change.to);
    }
}
