//! TOML-based application configuration.
//!
//! Stores the scheduling knobs:
//! - Weekly hour cap and fallback block length used by draft generation
//! - Whether published hours count toward the weekly cap
//! - Break-window avoidance and holiday skipping
//! - Logistics weekday set and search bound for delivery/pickup days
//!
//! Configuration is stored at `~/.config/pmplanner/config.toml`.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Draft scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    #[serde(default = "default_weekly_hour_cap")]
    pub weekly_hour_cap: u32,
    #[serde(default = "default_fallback_block_hours")]
    pub fallback_block_hours: u32,
    /// Count PUBLISHED items toward the weekly cap, not only drafts.
    #[serde(default)]
    pub count_published_hours: bool,
    /// Start blocks after the break when they would cross it.
    #[serde(default)]
    pub avoid_breaks: bool,
    #[serde(default = "default_true")]
    pub skip_holidays: bool,
}

/// Machinery logistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsConfig {
    /// Days on which deliveries and pickups can happen.
    #[serde(default = "default_allowed_weekdays")]
    pub allowed_weekdays: Vec<Weekday>,
    #[serde(default = "default_search_limit_days")]
    pub search_limit_days: u32,
    /// Upper bound of the work-day bucket label.
    #[serde(default = "default_max_work_days_bucket")]
    pub max_work_days_bucket: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pmplanner/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub logistics: LogisticsConfig,
}

fn default_weekly_hour_cap() -> u32 {
    42
}
fn default_fallback_block_hours() -> u32 {
    2
}
fn default_true() -> bool {
    true
}
fn default_allowed_weekdays() -> Vec<Weekday> {
    vec![Weekday::Mon, Weekday::Wed, Weekday::Sat]
}
fn default_search_limit_days() -> u32 {
    21
}
fn default_max_work_days_bucket() -> u32 {
    6
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            weekly_hour_cap: default_weekly_hour_cap(),
            fallback_block_hours: default_fallback_block_hours(),
            count_published_hours: false,
            avoid_breaks: false,
            skip_holidays: true,
        }
    }
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            allowed_weekdays: default_allowed_weekdays(),
            search_limit_days: default_search_limit_days(),
            max_work_days_bucket: default_max_work_days_bucket(),
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

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown().into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    // Lists accept either JSON or a comma-separated form: "Mon,Wed,Sat"
                    serde_json::Value::Array(_) => match serde_json::from_str(value) {
                        Ok(v) => v,
                        Err(_) => serde_json::Value::Array(
                            value
                                .split(',')
                                .map(|s| serde_json::Value::String(s.trim().to_string()))
                                .collect(),
                        ),
                    },
                    serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown().into())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
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

    /// Set a config value by key and save. Unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Set a config value in memory only.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}
