//! Tunables loaded from `config.json` in the data root.
//!
//! Every field has a default, so a missing or partial file is fine.

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShiftError};
use crate::storage::StorageConfig;

pub const DEFAULT_SHIFT_MINUTES: u32 = 480;
pub const DEFAULT_ANALYTICS_DAYS: u32 = 7;
pub const DEFAULT_ACTIVE_LOOKBACK_DAYS: u32 = 2;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    /// Length of a shift; blocked time is measured against it for efficiency.
    pub shift_minutes: u32,
    /// Analytics window reaches this many days back from today (inclusive of today).
    pub analytics_days: u32,
    /// How many days before today to search for the most recent active operators.
    pub active_lookback_days: u32,
    pub lock_timeout_ms: u64,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            shift_minutes: DEFAULT_SHIFT_MINUTES,
            analytics_days: DEFAULT_ANALYTICS_DAYS,
            active_lookback_days: DEFAULT_ACTIVE_LOOKBACK_DAYS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

/// Loads the configuration, returning defaults if the file is missing or malformed.
pub fn load_config(storage: &StorageConfig) -> ShiftConfig {
    let path = storage.config_file();
    let Ok(content) = fs::read_to_string(&path) else {
        return ShiftConfig::default();
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
            ShiftConfig::default()
        }
    }
}

pub fn save_config(storage: &StorageConfig, config: &ShiftConfig) -> Result<()> {
    let path = storage.config_file();
    fs::create_dir_all(storage.root()).map_err(|e| ShiftError::Io {
        context: format!("creating {}", storage.root().display()),
        source: e,
    })?;
    let content = serde_json::to_string_pretty(config).map_err(|e| ShiftError::Json {
        context: "serializing config".to_string(),
        source: e,
    })?;
    fs::write(&path, content).map_err(|e| ShiftError::Io {
        context: format!("writing {}", path.display()),
        source: e,
    })
}
