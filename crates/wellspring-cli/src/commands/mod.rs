pub mod config;
pub mod maintain;
pub mod profile;
pub mod recommend;
pub mod record;
pub mod state;
pub mod suggest;

use clap::Args;
use tracing::debug;
use wellspring_core::{
    AdaptiveEstimator, Config, Context, EnergyLevel, FixedSignal, Mood, ScheduleLoad, SqliteStore,
    TimeOfDay,
};

/// Context flags shared by every command that takes a context.
///
/// Missing flags fall back to the clock and to the `WELLSPRING_MOOD`,
/// `WELLSPRING_ENERGY` and `WELLSPRING_SCHEDULE` environment hints.
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Time of day (morning/day/evening/night)
    #[arg(long)]
    pub time: Option<TimeOfDay>,
    /// Mood (stressed/energized/calm/neutral)
    #[arg(long)]
    pub mood: Option<Mood>,
    /// Energy level (high/medium/low)
    #[arg(long)]
    pub energy: Option<EnergyLevel>,
    /// Schedule load (busy/moderate/free)
    #[arg(long)]
    pub schedule: Option<ScheduleLoad>,
}

impl ContextArgs {
    /// Resolve the current context and apply any explicit flags over it.
    pub fn resolve(&self, estimator: &AdaptiveEstimator) -> Context {
        let mut ctx = estimator.resolve_context();
        if let Some(time) = self.time {
            ctx.time_of_day = time;
        }
        if let Some(mood) = self.mood {
            ctx.user_mood = mood;
        }
        if let Some(energy) = self.energy {
            ctx.energy_level = energy;
        }
        if let Some(schedule) = self.schedule {
            ctx.schedule = schedule;
        }
        ctx
    }
}

fn env_signal() -> FixedSignal {
    FixedSignal {
        mood: std::env::var("WELLSPRING_MOOD").ok(),
        energy: std::env::var("WELLSPRING_ENERGY").ok(),
        schedule: std::env::var("WELLSPRING_SCHEDULE").ok(),
    }
}

/// Open the estimator over the default SQLite store and config file.
pub fn open_estimator() -> Result<AdaptiveEstimator, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open()?;
    debug!(
        learning = config.estimator.learning_enabled,
        overrides = config.profiles.len(),
        "opened estimator store"
    );
    Ok(AdaptiveEstimator::with_config(&config, Box::new(store)).with_signal(Box::new(env_signal())))
}
