//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Countdown defaults and the accepted duration range
//! - Terminal display behavior
//! - Log filter
//!
//! Configuration is stored at `~/.config/cyclekeeper/config.toml`.
//! Cycles themselves are never written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

/// Countdown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
    #[serde(default = "default_min_minutes")]
    pub min_minutes: u32,
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,
    /// Sampling period in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Mirror the countdown into the terminal title.
    #[serde(default = "default_true")]
    pub set_terminal_title: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_minutes() -> u32 {
    25
}
fn default_min_minutes() -> u32 {
    1
}
fn default_max_minutes() -> u32 {
    60
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            min_minutes: default_min_minutes(),
            max_minutes: default_max_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            set_terminal_title: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown: CountdownConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CountdownConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check a requested duration against the configured range.
    pub fn check_minutes(&self, minutes: u32) -> Result<u32, ValidationError> {
        if (self.min_minutes..=self.max_minutes).contains(&minutes) {
            Ok(minutes)
        } else {
            Err(ValidationError::OutOfRange {
                field: "minutes".into(),
                min: i64::from(self.min_minutes),
                max: i64::from(self.max_minutes),
                value: i64::from(minutes),
            })
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
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
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("not a leaf key".into()));
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

    /// Config file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(Self::path_in(&config_dir()?))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
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

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Reject combinations that would make every start request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.countdown;
        if c.min_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "countdown.min_minutes".into(),
                message: "must be at least 1".into(),
            });
        }
        if c.min_minutes > c.max_minutes {
            return Err(ConfigError::InvalidValue {
                key: "countdown.max_minutes".into(),
                message: format!("must not be below min_minutes ({})", c.min_minutes),
            });
        }
        if c.check_minutes(c.default_minutes).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "countdown.default_minutes".into(),
                message: format!("must be between {} and {}", c.min_minutes, c.max_minutes),
            });
        }
        if c.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "countdown.tick_interval_ms".into(),
                message: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

/// Returns the configuration directory.
///
/// `CYCLEKEEPER_CONFIG_DIR` overrides the location outright; otherwise
/// `~/.config/cyclekeeper`, or `~/.config/cyclekeeper-dev` when
/// `CYCLEKEEPER_ENV=dev`.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os("CYCLEKEEPER_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CYCLEKEEPER_ENV").unwrap_or_else(|_| "production".to_string());
    Ok(if env == "dev" {
        base_dir.join("cyclekeeper-dev")
    } else {
        base_dir.join("cyclekeeper")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[countdown]\ndefault_minutes = 50\n").unwrap();
        assert_eq!(parsed.countdown.default_minutes, 50);
        assert_eq!(parsed.countdown.max_minutes, 60);
        assert!(parsed.display.set_terminal_title);
        assert_eq!(parsed.logging.filter, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("countdown.default_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("display.set_terminal_title").as_deref(), Some("true"));
        assert_eq!(cfg.get("logging.filter").as_deref(), Some("warn"));
        assert!(cfg.get("countdown.missing_key").is_none());
        assert!(cfg.get("countdown").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("countdown.default_minutes", "45").unwrap();
        cfg.set("display.set_terminal_title", "false").unwrap();
        cfg.set("logging.filter", "cyclekeeper_core=debug").unwrap();
        assert_eq!(cfg.countdown.default_minutes, 45);
        assert!(!cfg.display.set_terminal_title);
        assert_eq!(cfg.logging.filter, "cyclekeeper_core=debug");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("countdown.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("display.set_terminal_title", "not_a_bool").is_err());
        assert!(cfg.set("countdown.default_minutes", "-3").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_inconsistent_bounds() {
        let mut cfg = Config::default();
        assert!(cfg.set("countdown.min_minutes", "90").is_err());
        assert!(cfg.set("countdown.default_minutes", "61").is_err());
        assert!(cfg.set("countdown.tick_interval_ms", "0").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn check_minutes_uses_bounds() {
        let countdown = CountdownConfig::default();
        assert_eq!(countdown.check_minutes(1), Ok(1));
        assert_eq!(countdown.check_minutes(60), Ok(60));
        assert!(countdown.check_minutes(0).is_err());
        assert!(countdown.check_minutes(61).is_err());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::path_in(dir.path());
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::path_in(dir.path());
        std::fs::write(&path, "[countdown]\nmin_minutes = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::path_in(dir.path());
        let mut cfg = Config::default();
        cfg.set("countdown.default_minutes", "15").unwrap();
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap().countdown.default_minutes, 15);
    }
}
