//! Contextual multiplier tables.
//!
//! Two flavours exist:
//! - the static default tables, consulted directly by the contextual
//!   adjustment strategy;
//! - the learned [`MultiplierTable`], seeded from those defaults and nudged
//!   up or down after every completion or abandonment.
//!
//! Any `(value, activity)` pair without an entry has multiplier `1.0`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::{Context, EnergyLevel, Mood, ScheduleLoad, TimeOfDay};
use crate::profile::bound;

/// Activity columns of the default tables, in column order.
pub const DEFAULT_ACTIVITIES: [&str; 4] = ["meditation", "journal", "workout", "clarity"];

/// Factor applied to a context's multipliers after a completed session.
pub const REWARD_FACTOR: f64 = 1.05;

/// Factor applied to a context's multipliers after an abandoned session.
pub const PENALTY_FACTOR: f64 = 0.95;

fn column(row: [f64; 4], activity: &str) -> f64 {
    DEFAULT_ACTIVITIES
        .iter()
        .position(|a| *a == activity)
        .map(|i| row[i])
        .unwrap_or(1.0)
}

pub fn default_time_factor(value: TimeOfDay, activity: &str) -> f64 {
    let row = match value {
        TimeOfDay::Morning => [1.2, 1.1, 1.3, 1.0],
        TimeOfDay::Day => [0.8, 0.9, 1.0, 1.1],
        TimeOfDay::Evening => [1.0, 1.2, 0.8, 0.9],
        TimeOfDay::Night => [0.9, 1.0, 0.4, 0.7],
    };
    column(row, activity)
}

pub fn default_mood_factor(value: Mood, activity: &str) -> f64 {
    let row = match value {
        Mood::Stressed => [1.4, 1.2, 0.7, 0.8],
        Mood::Energized => [0.8, 0.9, 1.3, 1.2],
        Mood::Calm => [1.1, 1.1, 0.9, 1.0],
        Mood::Neutral => [1.0, 1.0, 1.0, 1.0],
    };
    column(row, activity)
}

pub fn default_energy_factor(value: EnergyLevel, activity: &str) -> f64 {
    let row = match value {
        EnergyLevel::High => [0.8, 0.9, 1.3, 1.1],
        EnergyLevel::Medium => [1.0, 1.0, 1.0, 1.0],
        EnergyLevel::Low => [1.3, 1.1, 0.6, 0.8],
    };
    column(row, activity)
}

pub fn default_schedule_factor(value: ScheduleLoad, activity: &str) -> f64 {
    let row = match value {
        ScheduleLoad::Busy => [1.2, 0.8, 0.7, 0.9],
        ScheduleLoad::Moderate => [1.0, 1.0, 1.0, 1.0],
        ScheduleLoad::Free => [0.9, 1.1, 1.2, 1.1],
    };
    column(row, activity)
}

type ActivityFactors = BTreeMap<String, f64>;

/// Learned per-dimension, per-activity multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplierTable {
    #[serde(default)]
    pub time_of_day: BTreeMap<TimeOfDay, ActivityFactors>,
    #[serde(default)]
    pub user_mood: BTreeMap<Mood, ActivityFactors>,
    #[serde(default)]
    pub energy_level: BTreeMap<EnergyLevel, ActivityFactors>,
    #[serde(default)]
    pub schedule: BTreeMap<ScheduleLoad, ActivityFactors>,
}

impl Default for MultiplierTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn seed<K: Ord + Copy>(values: &[K], factor: impl Fn(K, &str) -> f64) -> BTreeMap<K, ActivityFactors> {
    values
        .iter()
        .map(|&value| {
            let row = DEFAULT_ACTIVITIES
                .iter()
                .map(|a| (a.to_string(), factor(value, a)))
                .collect();
            (value, row)
        })
        .collect()
}

fn lookup<K: Ord>(map: &BTreeMap<K, ActivityFactors>, key: &K, activity: &str) -> f64 {
    map.get(key)
        .and_then(|row| row.get(activity))
        .copied()
        .unwrap_or(1.0)
}

fn scale<K: Ord>(
    map: &mut BTreeMap<K, ActivityFactors>,
    key: K,
    activity: &str,
    factor: f64,
    bounds: (f64, f64),
) {
    let entry = map
        .entry(key)
        .or_default()
        .entry(activity.to_string())
        .or_insert(1.0);
    *entry = bound(*entry * factor, bounds.0, bounds.1);
}

fn merge<K: Ord>(into: &mut BTreeMap<K, ActivityFactors>, from: BTreeMap<K, ActivityFactors>) {
    for (key, row) in from {
        let target = into.entry(key).or_default();
        for (activity, factor) in row {
            if factor.is_finite() && factor > 0.0 {
                target.insert(activity, factor);
            }
        }
    }
}

impl MultiplierTable {
    /// Table seeded with the default policy constants.
    pub fn with_defaults() -> Self {
        Self {
            time_of_day: seed(&TimeOfDay::ALL, default_time_factor),
            user_mood: seed(&Mood::ALL, default_mood_factor),
            energy_level: seed(&EnergyLevel::ALL, default_energy_factor),
            schedule: seed(&ScheduleLoad::ALL, default_schedule_factor),
        }
    }

    pub fn time_factor(&self, value: TimeOfDay, activity: &str) -> f64 {
        lookup(&self.time_of_day, &value, activity)
    }

    pub fn mood_factor(&self, value: Mood, activity: &str) -> f64 {
        lookup(&self.user_mood, &value, activity)
    }

    pub fn energy_factor(&self, value: EnergyLevel, activity: &str) -> f64 {
        lookup(&self.energy_level, &value, activity)
    }

    pub fn schedule_factor(&self, value: ScheduleLoad, activity: &str) -> f64 {
        lookup(&self.schedule, &value, activity)
    }

    /// Product of the four learned factors for `context`.
    pub fn product(&self, context: &Context, activity: &str) -> f64 {
        self.time_factor(context.time_of_day, activity)
            * self.mood_factor(context.user_mood, activity)
            * self.energy_factor(context.energy_level, activity)
            * self.schedule_factor(context.schedule, activity)
    }

    /// Multiply the four entries selected by `context` by `factor`, keeping
    /// each within `bounds`.
    pub fn adjust(&mut self, context: &Context, activity: &str, factor: f64, bounds: (f64, f64)) {
        scale(&mut self.time_of_day, context.time_of_day, activity, factor, bounds);
        scale(&mut self.user_mood, context.user_mood, activity, factor, bounds);
        scale(&mut self.energy_level, context.energy_level, activity, factor, bounds);
        scale(&mut self.schedule, context.schedule, activity, factor, bounds);
    }

    /// Overlay `other` on top of this table key by key. Non-positive or
    /// non-finite factors in `other` are ignored.
    pub fn merge_from(&mut self, other: MultiplierTable) {
        merge(&mut self.time_of_day, other.time_of_day);
        merge(&mut self.user_mood, other.user_mood);
        merge(&mut self.energy_level, other.energy_level);
        merge(&mut self.schedule, other.schedule);
    }
}
