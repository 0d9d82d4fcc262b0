use crate::error::{BaylineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// MismatchPolicy
// ---------------------------------------------------------------------------

/// What to do when the bay feed reports an active session's bay as free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Log and publish the mismatch, leave the session alone.
    #[default]
    Observe,
    /// Force-complete the session.
    Complete,
}

// ---------------------------------------------------------------------------
// TrackerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_promotion_interval")]
    pub promotion_interval_secs: u64,
    #[serde(default = "default_expiry_interval")]
    pub expiry_interval_secs: u64,
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: i64,
    #[serde(default = "default_location")]
    pub default_location: String,
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
}

fn default_promotion_interval() -> u64 {
    30
}

fn default_expiry_interval() -> u64 {
    60
}

fn default_duration_minutes() -> i64 {
    60
}

fn default_location() -> String {
    "main".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            promotion_interval_secs: default_promotion_interval(),
            expiry_interval_secs: default_expiry_interval(),
            default_duration_minutes: default_duration_minutes(),
            default_location: default_location(),
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

impl TrackerConfig {
    pub fn promotion_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.promotion_interval_secs)
    }

    pub fn expiry_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.expiry_interval_secs)
    }

    /// Falls back to the built-in default when the configured value does not
    /// fit in a `chrono::Duration`; `validate` reports that case as an error.
    pub fn default_duration(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.default_duration_minutes)
            .unwrap_or_else(|| chrono::Duration::minutes(default_duration_minutes()))
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let t = &self.tracker;

        if t.promotion_interval_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tracker.promotion_interval_secs must be greater than zero".into(),
            });
        }
        if t.expiry_interval_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tracker.expiry_interval_secs must be greater than zero".into(),
            });
        }
        if t.expiry_interval_secs != 0 && t.expiry_interval_secs < t.promotion_interval_secs {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "tracker.expiry_interval_secs ({}) is shorter than promotion_interval_secs ({})",
                    t.expiry_interval_secs, t.promotion_interval_secs
                ),
            });
        }
        if t.default_duration_minutes <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tracker.default_duration_minutes must be positive".into(),
            });
        } else if chrono::Duration::try_minutes(t.default_duration_minutes).is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "tracker.default_duration_minutes ({}) is out of range",
                    t.default_duration_minutes
                ),
            });
        }
        if t.default_location.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "tracker.default_location is empty".into(),
            });
        }

        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(BaylineError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
