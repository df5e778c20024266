//! The adaptive duration estimator.
//!
//! [`AdaptiveEstimator`] owns every activity profile, the learned multiplier
//! table and the preference log. Hosts ask it for recommendations, report
//! outcomes back, and schedule [`AdaptiveEstimator::run_periodic_maintenance`]
//! on their own timer.
//!
//! State is loaded from the injected [`KeyValueStore`] on construction and
//! written back after every recorded event; store failures are logged and
//! never surface to the caller.

mod blend;
mod maintenance;
mod recorder;

pub use blend::{Recommendation, StrategyEstimate, Suggestion, SuggestionKind};
pub use maintenance::MaintenanceReport;

use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::context::{Context, ContextResolver, ExternalContextSignal};
use crate::error::{CoreError, Result};
use crate::multipliers::MultiplierTable;
use crate::preferences::PreferenceLog;
use crate::profile::{default_profiles, ActivityProfile};
use crate::snapshot::{
    decode_preferences, decode_profiles, decode_snapshot, EstimatorSnapshot, PreferencesBlob,
    ProfilesBlob, SCHEMA_VERSION,
};
use crate::storage::{
    Config, EstimatorConfig, KeyValueStore, ProfileOverride, PREFERENCES_KEY, PROFILES_KEY,
};

/// Overrides whose resolved profile keeps `min <= base <= max`.
fn usable_overrides(
    configured: &BTreeMap<String, ProfileOverride>,
) -> BTreeMap<String, ProfileOverride> {
    let builtins = default_profiles();
    configured
        .iter()
        .filter(|(id, overrides)| {
            let usable = overrides.apply(id, builtins.get(id.as_str())).is_well_formed();
            if !usable {
                warn!(activity = %id, "ignoring profile override with inverted bounds");
            }
            usable
        })
        .map(|(id, overrides)| (id.clone(), overrides.clone()))
        .collect()
}

pub struct AdaptiveEstimator {
    config: EstimatorConfig,
    overrides: BTreeMap<String, ProfileOverride>,
    profiles: BTreeMap<String, ActivityProfile>,
    multipliers: MultiplierTable,
    preferences: PreferenceLog,
    store: Box<dyn KeyValueStore>,
    resolver: ContextResolver,
}

impl AdaptiveEstimator {
    /// Create an estimator with default configuration, loading any state
    /// already present in `store`.
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_config(&Config::default(), store)
    }

    /// Create an estimator from a full configuration, loading any state
    /// already present in `store`.
    pub fn with_config(config: &Config, store: Box<dyn KeyValueStore>) -> Self {
        let mut estimator = Self {
            config: config.estimator.clone(),
            overrides: usable_overrides(&config.profiles),
            profiles: BTreeMap::new(),
            multipliers: MultiplierTable::default(),
            preferences: PreferenceLog::default(),
            store,
            resolver: ContextResolver::default(),
        };
        estimator.reset_in_memory();
        estimator.load();
        estimator
    }

    /// Replace the source of mood, energy and schedule hints.
    pub fn with_signal(mut self, signal: Box<dyn ExternalContextSignal>) -> Self {
        self.resolver = ContextResolver::new(signal);
        self
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Gate every baseline and multiplier mutation. History logs keep
    /// recording while learning is off.
    pub fn set_learning_enabled(&mut self, enabled: bool) {
        self.config.learning_enabled = enabled;
    }

    pub fn is_learning_enabled(&self) -> bool {
        self.config.learning_enabled
    }

    pub fn profile(&self, activity_id: &str) -> Option<&ActivityProfile> {
        self.profiles.get(activity_id)
    }

    pub fn activities(&self) -> impl Iterator<Item = &str> + '_ {
        self.profiles.keys().map(String::as_str)
    }

    pub fn multipliers(&self) -> &MultiplierTable {
        &self.multipliers
    }

    pub fn preference_log(&self) -> &PreferenceLog {
        &self.preferences
    }

    /// Current context from the clock and signal source.
    pub fn resolve_context(&self) -> Context {
        self.resolver.resolve()
    }

    fn context_or_now(&self, context: Option<Context>) -> Context {
        context.unwrap_or_else(|| self.resolver.resolve())
    }

    /// Built-in profiles with configured overrides applied.
    fn configured_profiles(&self) -> BTreeMap<String, ActivityProfile> {
        let mut profiles = default_profiles();
        for (id, overrides) in &self.overrides {
            let profile = overrides.apply(id, profiles.get(id));
            profiles.insert(id.clone(), profile);
        }
        profiles
    }

    fn reset_in_memory(&mut self) {
        self.profiles = self.configured_profiles();
        self.multipliers = MultiplierTable::default();
        self.preferences = PreferenceLog::default();
    }

    /// Overlay loaded profiles on the configured defaults. Configured bounds
    /// and learning rates win; the learned baseline and history are kept.
    fn merge_profiles(&mut self, loaded: BTreeMap<String, ActivityProfile>) {
        for (id, profile) in loaded {
            let mut merged = match self.overrides.get(&id) {
                Some(overrides) => {
                    let mut p = overrides.apply(&id, Some(&profile));
                    p.set_base(profile.base_duration);
                    if p.is_well_formed() {
                        p
                    } else {
                        warn!(activity = %id, "profile override conflicts with persisted bounds, ignoring");
                        profile
                    }
                }
                None => profile,
            };
            merged.history.truncate(self.config.history_cap);
            self.profiles.insert(id, merged);
        }
    }

    fn load(&mut self) {
        match self.store.load(PROFILES_KEY) {
            Ok(Some(value)) => match decode_profiles(&value) {
                Ok(loaded) => {
                    debug!(count = loaded.len(), "loaded persisted profiles");
                    self.merge_profiles(loaded);
                }
                Err(e) => warn!(key = PROFILES_KEY, error = %e, "ignoring persisted profiles"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = PROFILES_KEY, error = %e, "failed to load profiles"),
        }

        match self.store.load(PREFERENCES_KEY) {
            Ok(Some(value)) => match decode_preferences(&value) {
                Ok(decoded) => {
                    if let Some(table) = decoded.multipliers {
                        self.multipliers.merge_from(table);
                    }
                    if let Some(mut log) = decoded.preference_log {
                        log.truncate(self.config.preference_cap);
                        self.preferences = log;
                    }
                }
                Err(e) => warn!(key = PREFERENCES_KEY, error = %e, "ignoring persisted preferences"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = PREFERENCES_KEY, error = %e, "failed to load preferences"),
        }
    }

    fn save_blob<T: serde::Serialize>(&self, key: &str, blob: &T) {
        let value = match serde_json::to_value(blob) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize estimator state");
                return;
            }
        };
        if let Err(e) = self.store.save(key, &value) {
            warn!(key, error = %e, "failed to persist estimator state");
        }
    }

    /// Write profiles, multipliers and the preference log to the store.
    pub fn flush(&self) {
        self.save_blob(
            PROFILES_KEY,
            &ProfilesBlob {
                version: SCHEMA_VERSION,
                profiles: &self.profiles,
            },
        );
        self.save_blob(
            PREFERENCES_KEY,
            &PreferencesBlob {
                version: SCHEMA_VERSION,
                multipliers: &self.multipliers,
                preference_log: &self.preferences,
            },
        );
    }

    /// Full snapshot of the learned state.
    pub fn snapshot(&self) -> EstimatorSnapshot {
        EstimatorSnapshot {
            version: SCHEMA_VERSION,
            exported_at: Utc::now(),
            profiles: self.profiles.clone(),
            multipliers: self.multipliers.clone(),
            preference_log: self.preferences.clone(),
        }
    }

    /// Snapshot as JSON, for the host's backup feature.
    pub fn export_state(&self) -> Value {
        serde_json::to_value(self.snapshot()).unwrap_or(Value::Null)
    }

    /// Replace the current state with an exported snapshot.
    ///
    /// Malformed profile entries or tables fall back to their defaults.
    ///
    /// # Errors
    /// Returns an error if `value` is not a snapshot of the current schema
    /// version; the current state is left untouched in that case.
    pub fn import_state(&mut self, value: &Value) -> Result<()> {
        let decoded = decode_snapshot(value).map_err(|e| CoreError::Snapshot(e.to_string()))?;

        self.reset_in_memory();
        self.merge_profiles(decoded.profiles);
        if let Some(table) = decoded.multipliers {
            self.multipliers.merge_from(table);
        }
        if let Some(mut log) = decoded.preference_log {
            log.truncate(self.config.preference_cap);
            self.preferences = log;
        }
        debug!(profiles = self.profiles.len(), "imported estimator state");
        self.flush();
        Ok(())
    }

    /// Discard all learned state and persist the defaults.
    pub fn reset(&mut self) {
        self.reset_in_memory();
        self.flush();
    }
}
