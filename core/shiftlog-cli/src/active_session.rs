//! Per-machine pointer to the operator session the CLI is working in.
//!
//! Each CLI invocation is a fresh process, so the session details entered with
//! `shiftlog session` (and the test-mode toggle) live in
//! `{data_root}/active_session.json` between commands.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use shiftlog_core::{Result, SessionContext, SessionInfo, ShiftError, StorageConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub session_info: Option<SessionInfo>,
}

impl ActiveSession {
    /// Context for the current command. `force_test_mode` comes from `--test-mode`.
    pub fn context(&self, storage: StorageConfig, force_test_mode: bool) -> SessionContext {
        SessionContext::new(storage, self.test_mode || force_test_mode)
            .with_session_info(self.session_info.clone())
    }
}

/// Missing or unreadable pointers mean no session yet.
pub fn load(storage: &StorageConfig) -> ActiveSession {
    let path = storage.active_session_file();
    let Ok(content) = fs::read_to_string(&path) else {
        return ActiveSession::default();
    };
    match serde_json::from_str(&content) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed active session");
            ActiveSession::default()
        }
    }
}

pub fn save(storage: &StorageConfig, session: &ActiveSession) -> Result<()> {
    let path = storage.active_session_file();
    fs::create_dir_all(storage.root()).map_err(|e| ShiftError::Io {
        context: format!("creating {}", storage.root().display()),
        source: e,
    })?;
    let content = serde_json::to_string_pretty(session).map_err(|e| ShiftError::Json {
        context: "serializing active session".to_string(),
        source: e,
    })?;
    fs::write(&path, content).map_err(|e| ShiftError::Io {
        context: format!("writing {}", path.display()),
        source: e,
    })
}
