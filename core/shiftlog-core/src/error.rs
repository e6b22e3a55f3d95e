//! Error types for shiftlog-core operations.
//!
//! Expected conditions (blank input, wrong tracker state, missing session
//! fields) are ordinary `Err` values that front ends turn into user messages.
//! A corrupt or missing store is never an error: it loads as an empty document.

use std::fmt;
use std::path::PathBuf;

/// Which operator-supplied field was blank after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Description,
    TicketNumber,
    Note,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputField::Description => "Blocker description",
            InputField::TicketNumber => "Ticket number",
            InputField::Note => "Note",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`ShiftError`], used by front ends to pick
/// an exit status or message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyInput,
    InvalidState,
    MissingRequiredSessionField,
    Storage,
}

/// All errors that can occur in shiftlog-core operations.
#[derive(Debug, thiserror::Error)]
pub enum ShiftError {
    // ─────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("{0} cannot be empty")]
    EmptyInput(InputField),

    // ─────────────────────────────────────────────────────────────────────
    // State Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("A blocker is already active: '{description}' (started {start_time}). End it first.")]
    AlreadyActive {
        description: String,
        start_time: String,
    },

    #[error("No active blocker. Start a blocker first.")]
    NoActiveBlocker,

    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Session setup required: {0} is missing")]
    MissingRequiredSessionField(&'static str),

    // ─────────────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Store is in-memory and has no file to save to")]
    NoStorePath,

    #[error("Timed out waiting for store lock: {}", .0.display())]
    LockTimeout(PathBuf),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ShiftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShiftError::EmptyInput(_) => ErrorKind::EmptyInput,
            ShiftError::AlreadyActive { .. } | ShiftError::NoActiveBlocker => {
                ErrorKind::InvalidState
            }
            ShiftError::MissingRequiredSessionField(_) => ErrorKind::MissingRequiredSessionField,
            ShiftError::NoStorePath
            | ShiftError::LockTimeout(_)
            | ShiftError::Io { .. }
            | ShiftError::Json { .. } => ErrorKind::Storage,
        }
    }

    /// True for conditions caused by operator input or tracker state rather
    /// than by the environment.
    pub fn is_expected(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }
}

/// Convenience type alias for Results using ShiftError.
pub type Result<T> = std::result::Result<T, ShiftError>;

impl From<ShiftError> for String {
    fn from(err: ShiftError) -> String {
        err.to_string()
    }
}
