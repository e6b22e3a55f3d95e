//! Session context: who is working, in which isolation mode, and therefore
//! which store file a tracker binds to.
//!
//! The context is an explicit value handed to every core call; nothing here
//! reads global state.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShiftError};
use crate::storage::StorageConfig;
use crate::types::SessionInfo;

/// Token used when no operator names are known.
pub const UNKNOWN_OPERATOR_TOKEN: &str = "NA";

/// Operator-entered session fields, before stamping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFields {
    pub pack_operator: String,
    pub support_operator: String,
    pub location: String,
    pub pack_number: String,
    pub key_used: String,
    pub glove_number: String,
    pub dongle_number: String,
    pub phone_id: String,
}

impl SessionFields {
    /// Trims every field. Empty values are allowed.
    pub fn trimmed(&self) -> Self {
        let t = |s: &String| s.trim().to_string();
        SessionFields {
            pack_operator: t(&self.pack_operator),
            support_operator: t(&self.support_operator),
            location: t(&self.location),
            pack_number: t(&self.pack_number),
            key_used: t(&self.key_used),
            glove_number: t(&self.glove_number),
            dongle_number: t(&self.dongle_number),
            phone_id: t(&self.phone_id),
        }
    }

    pub fn into_session_info(self, now: NaiveDateTime) -> SessionInfo {
        let f = self.trimmed();
        SessionInfo {
            pack_operator: f.pack_operator,
            support_operator: f.support_operator,
            location: f.location,
            pack_number: f.pack_number,
            key_used: f.key_used,
            glove_number: f.glove_number,
            dongle_number: f.dongle_number,
            phone_id: f.phone_id,
            date: now.date(),
            initialized_at: now,
        }
    }
}

/// Filename-safe operator token: names with spaces replaced by `-`, joined with `_`.
///
/// `("Jane Doe", "Bob")` → `"Jane-Doe_Bob"`; neither name → `"NA"`.
pub fn operator_token(pack_operator: &str, support_operator: &str) -> String {
    let pack = pack_operator.trim().replace(' ', "-");
    let support = support_operator.trim().replace(' ', "-");
    match (pack.is_empty(), support.is_empty()) {
        (false, false) => format!("{pack}_{support}"),
        (false, true) => pack,
        (true, false) => support,
        (true, true) => UNKNOWN_OPERATOR_TOKEN.to_string(),
    }
}

/// Individual operator names encoded in a token.
pub fn token_operators(token: &str) -> Vec<String> {
    token
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub storage: StorageConfig,
    /// Routes every operation to the single test store.
    pub test_mode: bool,
    pub session_info: Option<SessionInfo>,
}

impl SessionContext {
    pub fn new(storage: StorageConfig, test_mode: bool) -> Self {
        Self {
            storage,
            test_mode,
            session_info: None,
        }
    }

    pub fn with_session_info(mut self, info: Option<SessionInfo>) -> Self {
        self.session_info = info;
        self
    }

    pub fn operator_token(&self) -> String {
        match &self.session_info {
            Some(info) => operator_token(&info.pack_operator, &info.support_operator),
            None => UNKNOWN_OPERATOR_TOKEN.to_string(),
        }
    }

    /// The store file for this context on `today`.
    pub fn store_path(&self, today: NaiveDate) -> PathBuf {
        if self.test_mode {
            self.storage.test_data_file()
        } else {
            self.storage
                .operator_day_file(&self.operator_token(), today)
        }
    }

    /// Directory that analytics scan for this context's mode.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir(self.test_mode)
    }

    /// Gate used by front ends before showing dashboards and reports.
    pub fn require_pack_operator(&self) -> Result<&SessionInfo> {
        match &self.session_info {
            Some(info) if !info.pack_operator.trim().is_empty() => Ok(info),
            _ => Err(ShiftError::MissingRequiredSessionField("pack_operator")),
        }
    }
}
