use chrono::{Local, Timelike};
use tracing::debug;

use super::{Context, EnergyLevel, Mood, ScheduleLoad, TimeOfDay};

/// Optional host-supplied hints for the non-clock context dimensions.
///
/// Values are free-form strings; anything that does not parse falls back to
/// the neutral default for that dimension.
pub trait ExternalContextSignal: Send {
    fn mood_hint(&self) -> Option<String> {
        None
    }

    fn energy_hint(&self) -> Option<String> {
        None
    }

    fn schedule_hint(&self) -> Option<String> {
        None
    }
}

/// Signal source that never offers a hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignal;

impl ExternalContextSignal for NoSignal {}

/// Signal source with fixed hints, set once by the host.
#[derive(Debug, Clone, Default)]
pub struct FixedSignal {
    pub mood: Option<String>,
    pub energy: Option<String>,
    pub schedule: Option<String>,
}

impl ExternalContextSignal for FixedSignal {
    fn mood_hint(&self) -> Option<String> {
        self.mood.clone()
    }

    fn energy_hint(&self) -> Option<String> {
        self.energy.clone()
    }

    fn schedule_hint(&self) -> Option<String> {
        self.schedule.clone()
    }
}

/// Builds a [`Context`] from the clock and an [`ExternalContextSignal`].
pub struct ContextResolver {
    signal: Box<dyn ExternalContextSignal>,
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self::new(Box::new(NoSignal))
    }
}

impl ContextResolver {
    pub fn new(signal: Box<dyn ExternalContextSignal>) -> Self {
        Self { signal }
    }

    /// Resolve the context for the current local time.
    pub fn resolve(&self) -> Context {
        self.resolve_at_hour(Local::now().hour())
    }

    /// Resolve the context for a given hour of day. Never fails.
    pub fn resolve_at_hour(&self, hour: u32) -> Context {
        Context {
            time_of_day: TimeOfDay::from_hour(hour),
            user_mood: parse_hint::<Mood>("mood", self.signal.mood_hint()),
            energy_level: parse_hint::<EnergyLevel>("energy", self.signal.energy_hint()),
            schedule: parse_hint::<ScheduleLoad>("schedule", self.signal.schedule_hint()),
        }
    }
}

fn parse_hint<T>(dimension: &str, hint: Option<String>) -> T
where
    T: std::str::FromStr + Default,
{
    match hint {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            debug!(dimension, hint = %raw, "ignoring unrecognized context hint");
            T::default()
        }),
        None => T::default(),
    }
}
