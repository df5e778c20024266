//! Situational context used to select history and scale recommendations.
//!
//! A [`Context`] is an immutable snapshot of four dimensions: time of day,
//! mood, energy and schedule load. The [`ContextResolver`] builds one from
//! the wall clock plus optional host-supplied hints.

mod resolver;

pub use resolver::{ContextResolver, ExternalContextSignal, FixedSignal, NoSignal};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Time-of-day bucket derived from the wall-clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Day,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Bucket an hour (0-23): [5,10) morning, [10,18) day, [18,22) evening,
    /// everything else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=9 => TimeOfDay::Morning,
            10..=17 => TimeOfDay::Day,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Day => "day",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Self-reported or inferred mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Stressed,
    Energized,
    Calm,
    #[default]
    Neutral,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Stressed, Mood::Energized, Mood::Calm, Mood::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Stressed => "stressed",
            Mood::Energized => "energized",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
        }
    }
}

/// Energy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl EnergyLevel {
    pub const ALL: [EnergyLevel; 3] = [EnergyLevel::High, EnergyLevel::Medium, EnergyLevel::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::High => "high",
            EnergyLevel::Medium => "medium",
            EnergyLevel::Low => "low",
        }
    }
}

/// How loaded the user's schedule is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleLoad {
    Busy,
    #[default]
    Moderate,
    Free,
}

impl ScheduleLoad {
    pub const ALL: [ScheduleLoad; 3] = [ScheduleLoad::Busy, ScheduleLoad::Moderate, ScheduleLoad::Free];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleLoad::Busy => "busy",
            ScheduleLoad::Moderate => "moderate",
            ScheduleLoad::Free => "free",
        }
    }
}

macro_rules! impl_text {
    ($ty:ty, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase();
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| ValidationError::InvalidValue {
                        field: $field.to_string(),
                        message: format!("unknown value '{s}'"),
                    })
            }
        }
    };
}

impl_text!(TimeOfDay, "time_of_day");
impl_text!(Mood, "mood");
impl_text!(EnergyLevel, "energy_level");
impl_text!(ScheduleLoad, "schedule");

/// Immutable snapshot of the four context dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub time_of_day: TimeOfDay,
    pub user_mood: Mood,
    pub energy_level: EnergyLevel,
    pub schedule: ScheduleLoad,
}

impl Context {
    pub fn new(
        time_of_day: TimeOfDay,
        user_mood: Mood,
        energy_level: EnergyLevel,
        schedule: ScheduleLoad,
    ) -> Self {
        Self {
            time_of_day,
            user_mood,
            energy_level,
            schedule,
        }
    }

    /// Neutral context for a given time bucket.
    pub fn neutral(time_of_day: TimeOfDay) -> Self {
        Self::new(
            time_of_day,
            Mood::default(),
            EnergyLevel::default(),
            ScheduleLoad::default(),
        )
    }

    /// Whether this context matches `other` on time of day and mood.
    pub fn matches_pattern(&self, other: &Context) -> bool {
        self.time_of_day == other.time_of_day && self.user_mood == other.user_mood
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_bucket_boundaries() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(9), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(10), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_hour(18), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(22), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Stressed".parse::<Mood>().unwrap(), Mood::Stressed);
        assert_eq!(" low ".parse::<EnergyLevel>().unwrap(), EnergyLevel::Low);
        assert!("sleepy".parse::<Mood>().is_err());
    }

    #[test]
    fn context_serializes_with_camel_case_keys() {
        let ctx = Context::neutral(TimeOfDay::Day);
        let json = serde_json::to_value(ctx).unwrap();
        assert_eq!(json["timeOfDay"], "day");
        assert_eq!(json["userMood"], "neutral");
        assert_eq!(json["energyLevel"], "medium");
        assert_eq!(json["schedule"], "moderate");
    }

    #[test]
    fn pattern_match_ignores_energy_and_schedule() {
        let a = Context::new(TimeOfDay::Morning, Mood::Calm, EnergyLevel::High, ScheduleLoad::Busy);
        let b = Context::new(TimeOfDay::Morning, Mood::Calm, EnergyLevel::Low, ScheduleLoad::Free);
        let c = Context::new(TimeOfDay::Night, Mood::Calm, EnergyLevel::High, ScheduleLoad::Busy);
        assert!(a.matches_pattern(&b));
        assert!(!a.matches_pattern(&c));
    }
}
