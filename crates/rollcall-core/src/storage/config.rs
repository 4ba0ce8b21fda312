//! TOML-based application configuration.
//!
//! Stores the behavior flags the eligibility core consults:
//! - time-window enforcement and time-slot format relaxation
//! - geofence radius and geolocation timeout
//! - rep access policy (open dashboard vs PIN)
//! - remote sync endpoint
//!
//! Configuration is stored at `~/.config/rollcall/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Attendance eligibility flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceConfig {
    /// When true, check-in is gated to the session's scheduled day and
    /// time slot. Applies to both GPS and manual paths.
    #[serde(default)]
    pub enforce_time_window: bool,
    /// When true, timetable entries accept any time-slot string instead of
    /// the authored `H:MM AM - H:MM PM` format.
    #[serde(default)]
    pub allow_any_time_slot_format: bool,
    #[serde(default = "default_geofence_radius")]
    pub geofence_radius_m: f64,
    /// Caller-specified timeout for a geolocation fix.
    #[serde(default = "default_location_timeout")]
    pub location_timeout_secs: u64,
}

/// Course-rep access policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepConfig {
    /// When true (default), the rep dashboard opens without a PIN.
    #[serde(default = "default_true")]
    pub auth_optional: bool,
    /// When PIN auth is required, accept any email rather than a fixed list.
    #[serde(default = "default_true")]
    pub allow_any_email: bool,
}

/// Remote document-store sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the document store, e.g. `https://store.example.com/v1`.
    #[serde(default)]
    pub base_url: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/rollcall/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub attendance: AttendanceConfig,
    #[serde(default)]
    pub rep: RepConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_geofence_radius() -> f64 {
    100.0
}
fn default_location_timeout() -> u64 {
    20
}
fn default_true() -> bool {
    true
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            enforce_time_window: false,
            allow_any_time_slot_format: false,
            geofence_radius_m: default_geofence_radius(),
            location_timeout_secs: default_location_timeout(),
        }
    }
}

impl Default for RepConfig {
    fn default() -> Self {
        Self {
            auth_optional: true,
            allow_any_email: true,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
        }
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(invalid("config key is empty".into()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| invalid("unknown config key".into()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| invalid("unknown config key".into()))?;
        }

        Err(invalid("unknown config key".into()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("."),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write-and-return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning the default on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
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

    /// Set a config value by key and persist. Returns an error for unknown
    /// keys or unparseable values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()?;
        Ok(())
    }
}
