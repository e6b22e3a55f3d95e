//! Compiled regex patterns.
//!
//! Compiled once on first use and shared by every caller.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Store File Names
// ═══════════════════════════════════════════════════════════════════════════════

/// `{operators}_eod_data_{YYYY-MM-DD}.json`
pub static RE_STORE_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<operators>.+)_eod_data_(?P<date>\d{4}-\d{2}-\d{2})\.json$").unwrap()
});
