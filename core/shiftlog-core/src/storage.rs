//! Storage configuration and path management for shiftlog.
//!
//! All file paths are decided here so the tracker, the reports and the CLI
//! agree on where a given store key lives.
//!
//! ```text
//! ~/.shiftlog/
//! ├── config.json
//! ├── active_session.json                    (front-end session pointer)
//! ├── logs/
//! ├── production/{operators}_eod_data_{YYYY-MM-DD}.json
//! └── test/test_data.json
//! ```
//!
//! Production code uses `StorageConfig::default()`.
//! Tests use `StorageConfig::with_root(temp_dir)` for isolation.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::timestamp::DATE_FORMAT;

/// Environment variable that overrides the default data root.
pub const DATA_DIR_ENV: &str = "SHIFTLOG_DATA_DIR";

/// Infix between the operator token and the date in store file names.
pub const STORE_FILE_INFIX: &str = "_eod_data_";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self {
                root: PathBuf::from(dir),
            };
        }
        let root = dirs::home_dir()
            .map(|h| h.join(".shiftlog"))
            .unwrap_or_else(|| PathBuf::from(".shiftlog"));
        Self { root }
    }
}

impl StorageConfig {
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Global Files
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Which operators the CLI is currently working as.
    pub fn active_session_file(&self) -> PathBuf {
        self.root.join("active_session.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn production_dir(&self) -> PathBuf {
        self.root.join("production")
    }

    pub fn test_dir(&self) -> PathBuf {
        self.root.join("test")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Directory holding the store files for the given isolation mode.
    pub fn data_dir(&self, test_mode: bool) -> PathBuf {
        if test_mode {
            self.test_dir()
        } else {
            self.production_dir()
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Store Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// The single store used in test mode, regardless of operator or day.
    pub fn test_data_file(&self) -> PathBuf {
        self.test_dir().join("test_data.json")
    }

    /// Example: `production/jane-doe_bob_eod_data_2024-03-01.json`
    pub fn operator_day_file(&self, operator_token: &str, day: NaiveDate) -> PathBuf {
        self.production_dir()
            .join(store_file_name(operator_token, day))
    }
}

pub fn store_file_name(operator_token: &str, day: NaiveDate) -> String {
    format!(
        "{}{}{}.json",
        operator_token,
        STORE_FILE_INFIX,
        day.format(DATE_FORMAT)
    )
}
