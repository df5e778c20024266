//! Integration tests for the estimator's public API.
//!
//! Covers the read path, the outcome recorder and the export/import
//! workflow end to end against an in-memory store.

use wellspring_core::{
    AdaptiveEstimator, Context, EnergyLevel, MemoryStore, Mood, OutcomeEvent, ScheduleLoad,
    SuggestionKind, TimeOfDay,
};

fn estimator() -> AdaptiveEstimator {
    AdaptiveEstimator::new(Box::new(MemoryStore::new()))
}

fn battery() -> Vec<Context> {
    let mut contexts = Vec::new();
    for time in TimeOfDay::ALL {
        for mood in Mood::ALL {
            contexts.push(Context::new(time, mood, EnergyLevel::Medium, ScheduleLoad::Moderate));
        }
        for energy in EnergyLevel::ALL {
            for schedule in ScheduleLoad::ALL {
                contexts.push(Context::new(time, Mood::Neutral, energy, schedule));
            }
        }
    }
    contexts
}

#[test]
fn test_fresh_meditation_recommendation() {
    let est = estimator();
    let ctx = Context::new(TimeOfDay::Day, Mood::Neutral, EnergyLevel::Medium, ScheduleLoad::Moderate);
    assert_eq!(est.get_optimal_duration("meditation", ctx), 8);
}

#[test]
fn test_unknown_activity_falls_back() {
    let est = estimator();
    assert_eq!(est.get_optimal_duration("nonexistent-activity", None), 10);
    let suggestions = est.get_suggested_durations("nonexistent-activity", Context::neutral(TimeOfDay::Day));
    assert!(suggestions.iter().all(|s| s.duration >= 1));
}

#[test]
fn test_read_path_is_idempotent_across_contexts() {
    let est = estimator();
    for ctx in battery() {
        for id in ["meditation", "journal", "workout", "clarity"] {
            assert_eq!(est.get_optimal_duration(id, ctx), est.get_optimal_duration(id, ctx));
        }
    }
}

#[test]
fn test_completion_moves_baseline_by_learning_rate() {
    let mut est = estimator();
    let ctx = Context::neutral(TimeOfDay::Evening);
    let before = est.profile("journal").unwrap().base_duration;
    est.record_complete("journal", before + 20.0, Some(7.0), ctx).unwrap();
    let after = est.profile("journal").unwrap().base_duration;
    assert!((after - before - 2.0).abs() < 1e-9);
}

#[test]
fn test_abandonments_strictly_decrease_baseline() {
    let mut est = estimator();
    let ctx = Context::neutral(TimeOfDay::Morning);
    let mut last = est.profile("meditation").unwrap().base_duration;
    for _ in 0..3 {
        est.record_abandon("meditation", 4.0, Some("interrupted"), ctx).unwrap();
        let now = est.profile("meditation").unwrap().base_duration;
        assert!(now < last, "{now} should be below {last}");
        last = now;
    }
}

#[test]
fn test_rejected_events_leave_state_untouched() {
    let mut est = estimator();
    let ctx = Context::neutral(TimeOfDay::Day);
    let before = est.export_state();

    assert!(est.record_complete("workout", f64::NAN, None, ctx).is_err());
    assert!(est.record_abandon("workout", -1.0, None, ctx).is_err());
    assert!(est.record_feedback("workout", 20.0, f64::INFINITY, ctx).is_err());

    let after = est.export_state();
    assert_eq!(before["profiles"], after["profiles"]);
    assert_eq!(before["multipliers"], after["multipliers"]);
    assert_eq!(after["preferenceLog"], serde_json::json!({}));
}

#[test]
fn test_suggestions_keep_order_after_learning() {
    let mut est = estimator();
    let ctx = Context::new(TimeOfDay::Morning, Mood::Calm, EnergyLevel::High, ScheduleLoad::Free);
    for minutes in [22.0, 25.0, 24.0] {
        est.record_complete("workout", minutes, Some(8.0), ctx).unwrap();
    }

    let suggestions = est.get_suggested_durations("workout", ctx);
    let kinds: Vec<_> = suggestions.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![SuggestionKind::Quick, SuggestionKind::Recommended, SuggestionKind::Extended]
    );
    assert!(suggestions.iter().all(|s| s.confidence > 0.3));
    assert!(suggestions[0].duration <= suggestions[1].duration);
    assert!(suggestions[1].duration <= suggestions[2].duration);
}

#[test]
fn test_export_import_reproduces_recommendations() {
    let mut source = estimator();
    let morning = Context::new(TimeOfDay::Morning, Mood::Stressed, EnergyLevel::Low, ScheduleLoad::Busy);
    let night = Context::new(TimeOfDay::Night, Mood::Energized, EnergyLevel::High, ScheduleLoad::Free);
    source.record_complete("meditation", 18.0, Some(9.0), morning).unwrap();
    source.record_abandon("workout", 8.0, Some("tired"), night).unwrap();
    source.record_duration_change("journal", 15.0, 20.0, morning).unwrap();
    source.record_feedback("clarity", 12.0, 3.0, night).unwrap();
    source.run_periodic_maintenance();

    let exported = source.export_state();
    let mut target = estimator();
    target.import_state(&exported).unwrap();

    for ctx in battery() {
        for id in ["meditation", "journal", "workout", "clarity"] {
            assert_eq!(
                source.get_optimal_duration(id, ctx),
                target.get_optimal_duration(id, ctx),
                "{id} under {ctx:?}"
            );
        }
    }
    assert_eq!(source.multipliers(), target.multipliers());
}

#[test]
fn test_event_stream_matches_direct_calls() {
    let ctx = Context::neutral(TimeOfDay::Evening);
    let mut direct = estimator();
    direct.record_complete("journal", 30.0, None, ctx).unwrap();
    direct.record_feedback("journal", 30.0, 8.0, ctx).unwrap();

    let mut streamed = estimator();
    let events: Vec<OutcomeEvent> = serde_json::from_value(serde_json::json!([
        {"type": "completed", "activityId": "journal", "actualDuration": 30.0,
         "context": {"timeOfDay": "evening", "userMood": "neutral",
                     "energyLevel": "medium", "schedule": "moderate"}},
        {"type": "feedback", "activityId": "journal", "duration": 30.0, "rating": 8.0,
         "context": {"timeOfDay": "evening", "userMood": "neutral",
                     "energyLevel": "medium", "schedule": "moderate"}}
    ]))
    .unwrap();
    for event in events {
        streamed.record(event).unwrap();
    }

    assert_eq!(
        direct.profile("journal").unwrap().base_duration,
        streamed.profile("journal").unwrap().base_duration
    );
    assert_eq!(direct.get_optimal_duration("journal", ctx), streamed.get_optimal_duration("journal", ctx));
}
