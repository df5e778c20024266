//! Integration tests for persisting estimator state through SQLite.

use tempfile::TempDir;
use wellspring_core::storage::{KeyValueStore, PREFERENCES_KEY, PROFILES_KEY};
use wellspring_core::{
    AdaptiveEstimator, Config, Context, EnergyLevel, Mood, ScheduleLoad, SqliteStore, TimeOfDay,
};

fn open(dir: &TempDir) -> SqliteStore {
    SqliteStore::open_at(&dir.path().join("wellspring.db")).unwrap()
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let ctx = Context::new(TimeOfDay::Evening, Mood::Calm, EnergyLevel::Low, ScheduleLoad::Free);

    let (base, minutes, multipliers) = {
        let mut est = AdaptiveEstimator::new(Box::new(open(&dir)));
        est.record_complete("journal", 28.0, Some(9.0), ctx).unwrap();
        est.record_complete("journal", 26.0, Some(8.0), ctx).unwrap();
        est.record_abandon("workout", 6.0, Some("rain"), ctx).unwrap();
        (
            est.profile("journal").unwrap().base_duration,
            est.get_optimal_duration("journal", ctx),
            est.multipliers().clone(),
        )
    };

    let reopened = AdaptiveEstimator::new(Box::new(open(&dir)));
    let journal = reopened.profile("journal").unwrap();
    assert_eq!(journal.base_duration, base);
    assert_eq!(journal.history.completions.len(), 2);
    assert_eq!(reopened.get_optimal_duration("journal", ctx), minutes);
    assert_eq!(reopened.multipliers(), &multipliers);
    assert_eq!(
        reopened.profile("workout").unwrap().history.abandonments[0].reason.as_deref(),
        Some("rain")
    );
    assert_eq!(reopened.preference_log().len("journal"), 2);
}

#[test]
fn test_corrupt_profiles_recover_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store
        .save(
            PROFILES_KEY,
            &serde_json::json!({
                "version": 1,
                "profiles": {
                    "journal": {"activityId": "journal", "baseDuration": "long"},
                    "meditation": {
                        "activityId": "meditation",
                        "baseDuration": 14.0,
                        "minDuration": 2.0,
                        "maxDuration": 60.0,
                        "learningRate": 0.1
                    }
                }
            }),
        )
        .unwrap();
    store
        .save(PREFERENCES_KEY, &serde_json::json!({"version": 7}))
        .unwrap();

    let est = AdaptiveEstimator::new(Box::new(store));
    assert_eq!(est.profile("journal").unwrap().base_duration, 15.0);
    assert_eq!(est.profile("meditation").unwrap().base_duration, 14.0);
    assert!(est.preference_log().is_empty());
}

#[test]
fn test_configured_profile_persists_alongside_builtins() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[profiles.breathing]\nbase = 6.0\nmin = 2.0\nmax = 20.0\n",
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();
    assert_eq!(config.estimator.history_cap, 100);
    let ctx = Context::neutral(TimeOfDay::Night);
    {
        let mut est = AdaptiveEstimator::with_config(&config, Box::new(open(&dir)));
        assert_eq!(est.profile("breathing").unwrap().base_duration, 6.0);
        est.record_complete("breathing", 16.0, None, ctx).unwrap();
    }

    let est = AdaptiveEstimator::with_config(&config, Box::new(open(&dir)));
    assert!((est.profile("breathing").unwrap().base_duration - 7.0).abs() < 1e-9);
    assert_eq!(est.profile("breathing").unwrap().max_duration, 20.0);
}

#[test]
fn test_reset_clears_persisted_learning() {
    let dir = TempDir::new().unwrap();
    let ctx = Context::neutral(TimeOfDay::Day);
    {
        let mut est = AdaptiveEstimator::new(Box::new(open(&dir)));
        est.record_complete("clarity", 25.0, None, ctx).unwrap();
        est.reset();
    }
    let est = AdaptiveEstimator::new(Box::new(open(&dir)));
    assert_eq!(est.profile("clarity").unwrap().base_duration, 10.0);
    assert!(est.profile("clarity").unwrap().history.is_empty());
    assert!(est.preference_log().is_empty());
}
