//! Versioned JSON shapes for persisted and exported estimator state.
//!
//! Decoding is lenient per section: a malformed profile entry or table is
//! dropped (and reported) while the remaining sections still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::multipliers::MultiplierTable;
use crate::preferences::PreferenceLog;
use crate::profile::ActivityProfile;

/// Schema version written into every blob.
pub const SCHEMA_VERSION: u32 = 1;

/// Blob stored under [`PROFILES_KEY`](crate::storage::PROFILES_KEY).
#[derive(Debug, Clone, Serialize)]
pub struct ProfilesBlob<'a> {
    pub version: u32,
    pub profiles: &'a BTreeMap<String, ActivityProfile>,
}

/// Blob stored under [`PREFERENCES_KEY`](crate::storage::PREFERENCES_KEY).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesBlob<'a> {
    pub version: u32,
    pub multipliers: &'a MultiplierTable,
    pub preference_log: &'a PreferenceLog,
}

/// Full export of profiles, learned multipliers and preference log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatorSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub profiles: BTreeMap<String, ActivityProfile>,
    pub multipliers: MultiplierTable,
    #[serde(default)]
    pub preference_log: PreferenceLog,
}

/// Reason a blob could not be used at all.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    NotAnObject,
    VersionMismatch(Option<u64>),
    MissingSection(&'static str),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::NotAnObject => f.write_str("expected a JSON object"),
            DecodeError::VersionMismatch(Some(v)) => {
                write!(f, "schema version {v}, expected {SCHEMA_VERSION}")
            }
            DecodeError::VersionMismatch(None) => f.write_str("missing schema version"),
            DecodeError::MissingSection(name) => write!(f, "missing section '{name}'"),
        }
    }
}

fn check_version(value: &Value) -> Result<&serde_json::Map<String, Value>, DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    match obj.get("version").and_then(Value::as_u64) {
        Some(v) if v == u64::from(SCHEMA_VERSION) => Ok(obj),
        other => Err(DecodeError::VersionMismatch(other)),
    }
}

/// Decode a profile map entry by entry, skipping malformed entries.
pub fn decode_profile_map(section: &Value) -> BTreeMap<String, ActivityProfile> {
    let Some(entries) = section.as_object() else {
        warn!("profile section is not an object, ignoring");
        return BTreeMap::new();
    };

    let mut profiles = BTreeMap::new();
    for (id, raw) in entries {
        match serde_json::from_value::<ActivityProfile>(raw.clone()) {
            Ok(mut profile) if profile.is_well_formed() => {
                profile.activity_id = id.clone();
                profile.clamp_base();
                profiles.insert(id.clone(), profile);
            }
            Ok(_) => warn!(activity = %id, "persisted profile has invalid bounds, using default"),
            Err(e) => warn!(activity = %id, error = %e, "malformed persisted profile, using default"),
        }
    }
    profiles
}

/// Decode the blob stored under the profiles key.
pub fn decode_profiles(value: &Value) -> Result<BTreeMap<String, ActivityProfile>, DecodeError> {
    let obj = check_version(value)?;
    let section = obj
        .get("profiles")
        .ok_or(DecodeError::MissingSection("profiles"))?;
    Ok(decode_profile_map(section))
}

/// Decode a multiplier table section, if well formed.
pub fn decode_multipliers(section: Option<&Value>) -> Option<MultiplierTable> {
    let raw = section?;
    match serde_json::from_value(raw.clone()) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!(error = %e, "malformed multiplier table, using defaults");
            None
        }
    }
}

/// Decode a preference log section, if well formed.
pub fn decode_preference_log(section: Option<&Value>) -> Option<PreferenceLog> {
    let raw = section?;
    match serde_json::from_value(raw.clone()) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!(error = %e, "malformed preference log, starting empty");
            None
        }
    }
}

/// Decoded contents of the preferences key.
#[derive(Debug, Default)]
pub struct DecodedPreferences {
    pub multipliers: Option<MultiplierTable>,
    pub preference_log: Option<PreferenceLog>,
}

/// Decode the blob stored under the preferences key.
pub fn decode_preferences(value: &Value) -> Result<DecodedPreferences, DecodeError> {
    let obj = check_version(value)?;
    Ok(DecodedPreferences {
        multipliers: decode_multipliers(obj.get("multipliers")),
        preference_log: decode_preference_log(obj.get("preferenceLog")),
    })
}

/// Decoded contents of a full export.
#[derive(Debug)]
pub struct DecodedSnapshot {
    pub profiles: BTreeMap<String, ActivityProfile>,
    pub multipliers: Option<MultiplierTable>,
    pub preference_log: Option<PreferenceLog>,
}

/// Decode a full export produced by [`EstimatorSnapshot`].
pub fn decode_snapshot(value: &Value) -> Result<DecodedSnapshot, DecodeError> {
    let obj = check_version(value)?;
    let profiles = obj
        .get("profiles")
        .ok_or(DecodeError::MissingSection("profiles"))?;
    Ok(DecodedSnapshot {
        profiles: decode_profile_map(profiles),
        multipliers: decode_multipliers(obj.get("multipliers")),
        preference_log: decode_preference_log(obj.get("preferenceLog")),
    })
}
