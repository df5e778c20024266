//! TOML-based estimator configuration.
//!
//! Stores:
//! - Feature toggles for recommendations and learning
//! - History and preference-log retention
//! - Bounds for learned multipliers
//! - Per-activity profile overrides
//!
//! Configuration is stored at `~/.config/wellspring/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::profile::{default_profiles, ActivityProfile, DEFAULT_HISTORY_CAP};
use crate::preferences::DEFAULT_PREFERENCE_CAP;

/// Estimator tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub learning_enabled: bool,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    #[serde(default = "default_history_cap")]
    pub cleanup_keep: usize,
    #[serde(default = "default_preference_cap")]
    pub preference_cap: usize,
    #[serde(default = "default_preference_max_age_days")]
    pub preference_max_age_days: i64,
    /// Minutes returned for unknown activities.
    #[serde(default = "default_fallback_duration")]
    pub fallback_duration: u32,
    #[serde(default = "default_multiplier_min")]
    pub multiplier_min: f64,
    #[serde(default = "default_multiplier_max")]
    pub multiplier_max: f64,
}

/// Partial override for a built-in or custom activity profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/wellspring/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileOverride>,
}

fn default_true() -> bool {
    true
}
fn default_history_cap() -> usize {
    DEFAULT_HISTORY_CAP
}
fn default_preference_cap() -> usize {
    DEFAULT_PREFERENCE_CAP
}
fn default_preference_max_age_days() -> i64 {
    30
}
fn default_fallback_duration() -> u32 {
    10
}
fn default_multiplier_min() -> f64 {
    0.3
}
fn default_multiplier_max() -> f64 {
    2.5
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            learning_enabled: true,
            history_cap: default_history_cap(),
            cleanup_keep: default_history_cap(),
            preference_cap: default_preference_cap(),
            preference_max_age_days: default_preference_max_age_days(),
            fallback_duration: default_fallback_duration(),
            multiplier_min: default_multiplier_min(),
            multiplier_max: default_multiplier_max(),
        }
    }
}

impl EstimatorConfig {
    pub fn multiplier_bounds(&self) -> (f64, f64) {
        (self.multiplier_min, self.multiplier_max)
    }

    /// # Errors
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: format!("estimator.{key}"),
            message: message.to_string(),
        };

        if !(self.multiplier_min.is_finite() && self.multiplier_min > 0.0) {
            return Err(invalid("multiplier_min", "must be a positive number"));
        }
        if !(self.multiplier_max.is_finite() && self.multiplier_max >= self.multiplier_min) {
            return Err(invalid("multiplier_max", "must be >= multiplier_min"));
        }
        if self.history_cap == 0 {
            return Err(invalid("history_cap", "must be at least 1"));
        }
        if self.cleanup_keep == 0 {
            return Err(invalid("cleanup_keep", "must be at least 1"));
        }
        if self.preference_cap == 0 {
            return Err(invalid("preference_cap", "must be at least 1"));
        }
        if self.preference_max_age_days < 1 {
            return Err(invalid("preference_max_age_days", "must be at least 1"));
        }
        Ok(())
    }
}

impl ProfileOverride {
    /// Apply on top of `existing`, or on top of generic defaults for a new
    /// activity.
    pub fn apply(&self, activity_id: &str, existing: Option<&ActivityProfile>) -> ActivityProfile {
        let base = existing
            .cloned()
            .unwrap_or_else(|| ActivityProfile::new(activity_id, 10.0, 1.0, 60.0, 0.1));
        let mut profile = ActivityProfile::new(
            activity_id,
            self.base.unwrap_or(base.base_duration),
            self.min.unwrap_or(base.min_duration),
            self.max.unwrap_or(base.max_duration),
            self.learning_rate.unwrap_or(base.learning_rate),
        );
        profile.history = base.history;
        profile
    }

    fn validate(&self, activity_id: &str) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: &str| ConfigError::InvalidValue {
            key: format!("profiles.{activity_id}.{field}"),
            message: message.to_string(),
        };
        for (field, value) in [("base", self.base), ("min", self.min), ("max", self.max)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(field, "must be a non-negative number"));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid("min", "must be <= max"));
            }
        }
        if let Some(rate) = self.learning_rate {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(invalid("learning_rate", "must be in (0, 1]"));
            }
        }
        Ok(())
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let parse_err = |message: String| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message,
                };
                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| parse_err(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| parse_err(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(parse_err(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| parse_err(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the default config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/wellspring"),
                message: e.to_string(),
            })
    }

    /// Load from the default path, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_err = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_err(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.estimator.validate()?;
        let builtins = default_profiles();
        for (id, overrides) in &self.profiles {
            overrides.validate(id)?;
            if !overrides.apply(id, builtins.get(id)).is_well_formed() {
                return Err(ConfigError::InvalidValue {
                    key: format!("profiles.{id}.min"),
                    message: "resolved profile needs min <= max".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
