//! Sliding log of recent user actions, used for periodic re-estimation of
//! each activity's baseline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::context::Context;
use crate::profile::push_capped;

/// Default number of entries kept per activity.
pub const DEFAULT_PREFERENCE_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceAction {
    Started,
    Completed,
    Abandoned,
    DurationChanged,
    Feedback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceEntry {
    pub activity_id: String,
    pub action: PreferenceAction,
    pub duration: f64,
    pub context: Context,
    pub timestamp: DateTime<Utc>,
}

/// Per-activity bounded preference log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceLog {
    entries: BTreeMap<String, VecDeque<PreferenceEntry>>,
}

impl PreferenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PreferenceEntry, cap: usize) {
        let log = self.entries.entry(entry.activity_id.clone()).or_default();
        push_capped(log, entry, cap);
    }

    pub fn entries(&self, activity_id: &str) -> impl Iterator<Item = &PreferenceEntry> + '_ {
        self.entries.get(activity_id).into_iter().flatten()
    }

    pub fn len(&self, activity_id: &str) -> usize {
        self.entries.get(activity_id).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(VecDeque::is_empty)
    }

    /// Mean logged duration for an activity, if any entries exist.
    pub fn mean_duration(&self, activity_id: &str) -> Option<f64> {
        let log = self.entries.get(activity_id)?;
        if log.is_empty() {
            return None;
        }
        Some(log.iter().map(|e| e.duration).sum::<f64>() / log.len() as f64)
    }

    /// Drop entries with a timestamp before `cutoff`; returns how many went.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for log in self.entries.values_mut() {
            let before = log.len();
            log.retain(|e| e.timestamp >= cutoff);
            removed += before - log.len();
        }
        self.entries.retain(|_, log| !log.is_empty());
        removed
    }

    /// Enforce `cap` on every activity, keeping the newest entries.
    pub fn truncate(&mut self, cap: usize) {
        for log in self.entries.values_mut() {
            crate::profile::truncate_front(log, cap);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
