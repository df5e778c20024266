//! Thread-safe handle over one [`AdaptiveEstimator`].
//!
//! Each method takes the lock once for its whole duration, so a recorded
//! event and a concurrent recommendation never observe partial updates.

use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::context::Context;
use crate::error::{Result, ValidationError};
use crate::estimator::{AdaptiveEstimator, MaintenanceReport, Suggestion};
use crate::events::OutcomeEvent;

#[derive(Clone)]
pub struct SharedEstimator {
    inner: Arc<Mutex<AdaptiveEstimator>>,
}

impl SharedEstimator {
    pub fn new(estimator: AdaptiveEstimator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    /// Lock the estimator. State is consistent between operations, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, AdaptiveEstimator> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_optimal_duration(&self, activity_id: &str, context: impl Into<Option<Context>>) -> u32 {
        self.lock().get_optimal_duration(activity_id, context)
    }

    pub fn get_suggested_durations(
        &self,
        activity_id: &str,
        context: impl Into<Option<Context>>,
    ) -> Vec<Suggestion> {
        self.lock().get_suggested_durations(activity_id, context)
    }

    pub fn record(&self, event: OutcomeEvent) -> std::result::Result<(), ValidationError> {
        self.lock().record(event)
    }

    pub fn run_periodic_maintenance(&self) -> MaintenanceReport {
        self.lock().run_periodic_maintenance()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().set_enabled(enabled);
    }

    pub fn set_learning_enabled(&self, enabled: bool) {
        self.lock().set_learning_enabled(enabled);
    }

    pub fn export_state(&self) -> Value {
        self.lock().export_state()
    }

    pub fn import_state(&self, value: &Value) -> Result<()> {
        self.lock().import_state(value)
    }
}

impl From<AdaptiveEstimator> for SharedEstimator {
    fn from(estimator: AdaptiveEstimator) -> Self {
        Self::new(estimator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TimeOfDay;
    use crate::storage::MemoryStore;
    use std::thread;

    #[test]
    fn concurrent_events_are_all_applied() {
        let shared = SharedEstimator::new(AdaptiveEstimator::new(Box::new(MemoryStore::new())));
        let ctx = Context::neutral(TimeOfDay::Evening);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        shared
                            .record(OutcomeEvent::Started {
                                activity_id: "journal".into(),
                                planned_duration: 15.0,
                                context: Some(ctx),
                            })
                            .unwrap();
                        let minutes = shared.get_optimal_duration("journal", ctx);
                        assert!((5..=60).contains(&minutes));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let est = shared.lock();
        assert_eq!(est.profile("journal").unwrap().history.completions.len(), 40);
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let shared = SharedEstimator::new(AdaptiveEstimator::new(Box::new(MemoryStore::new())));
        let clone = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = clone.lock();
            panic!("poison");
        })
        .join();

        assert_eq!(shared.get_optimal_duration("unknown", None), 10);
    }
}
