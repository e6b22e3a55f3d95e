//! # shiftlog-core
//!
//! Core library for shiftlog: tracks blockers (work stoppages) during a shift,
//! persists them per operator and day, and builds end-of-day and manager reports.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Every call is a short file read or write.
//! - **Explicit context**: Callers pass a [`SessionContext`]; nothing reads global state.
//! - **Graceful degradation**: Missing or corrupt store files load as empty documents.
//! - **One writer at a time**: Mutations run under an advisory lock per store file.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shiftlog_core::{BlockerTracker, Category, SessionContext, ShiftConfig, StorageConfig};
//!
//! let ctx = SessionContext::new(StorageConfig::default(), false);
//! let mut tracker = BlockerTracker::open_today(&ctx, &ShiftConfig::default());
//! tracker.start("printer jam", Category::Hardware, None)?;
//! tracker.add_ticket("TCK-1", "http://tickets/1")?;
//! let done = tracker.end()?;
//! println!("{} minutes", done.duration_minutes);
//! ```

pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod patterns;
pub mod report;
pub mod session;
pub mod storage;
pub mod store;
pub mod timestamp;
pub mod tracker;
pub mod types;

pub use analytics::{multi_day_analytics, Analytics, AnalyticsOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_config, save_config, ShiftConfig};
pub use error::{ErrorKind, InputField, Result, ShiftError};
pub use report::{eod_report, todays_summary, EodReport, TodaySummary};
pub use session::{SessionContext, SessionFields};
pub use storage::StorageConfig;
pub use store::{load_document, save_document, DocumentStore};
pub use tracker::{BlockerTracker, NewTicket, RecoveryNotice};
pub use types::*;
