//! # Wellspring Core Library
//!
//! This library provides the adaptive duration estimator behind Wellspring's
//! wellness activities. It recommends how long a meditation, journaling,
//! workout or clarity session should last right now, and learns from what
//! the user actually does with that recommendation.
//!
//! ## Architecture
//!
//! - **Context**: time-of-day bucketing plus host-supplied mood, energy and
//!   schedule hints
//! - **Strategies**: four independent, pure duration estimators
//! - **Blending**: weighted combination of the strategies, scaled by the
//!   learned multiplier table and clamped to the activity's bounds
//! - **Recorder**: outcome events that shift baselines and multipliers
//! - **Maintenance**: host-scheduled re-estimation and log cleanup
//! - **Storage**: opaque JSON blobs behind a key-value trait, with SQLite and
//!   in-memory backends, and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`AdaptiveEstimator`]: owns all learned state
//! - [`SharedEstimator`]: thread-safe handle over one estimator
//! - [`KeyValueStore`]: persistence seam implemented by hosts
//! - [`Config`]: application configuration management

pub mod context;
pub mod error;
pub mod estimator;
pub mod events;
pub mod multipliers;
pub mod preferences;
pub mod profile;
pub mod shared;
pub mod snapshot;
pub mod storage;
pub mod strategies;

pub use context::{
    Context, ContextResolver, EnergyLevel, ExternalContextSignal, FixedSignal, Mood, NoSignal,
    ScheduleLoad, TimeOfDay,
};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use estimator::{
    AdaptiveEstimator, MaintenanceReport, Recommendation, StrategyEstimate, Suggestion,
    SuggestionKind,
};
pub use events::OutcomeEvent;
pub use multipliers::MultiplierTable;
pub use preferences::{PreferenceAction, PreferenceEntry, PreferenceLog};
pub use profile::{ActivityProfile, History, SessionStatus};
pub use shared::SharedEstimator;
pub use snapshot::EstimatorSnapshot;
pub use storage::{Config, EstimatorConfig, KeyValueStore, MemoryStore, ProfileOverride, SqliteStore};
pub use strategies::Strategy;
