//! Persisted data model.
//!
//! One [`Document`] per store file:
//!
//! ```json
//! {
//!   "blockers": [ { "description": "...", "category": "hardware",
//!                   "start_time": "2024-03-01 09:00:00",
//!                   "end_time": "2024-03-01 09:45:30",
//!                   "duration_minutes": 45,
//!                   "tickets": [ { "number": "TCK-1", "link": "LINK: http://x" } ],
//!                   "notes": [ { "content": "...", "timestamp": "..." } ] } ],
//!   "current_blocker": null,
//!   "last_updated": "2024-03-01 09:45:30",
//!   "session_info": { ... }
//! }
//! ```
//!
//! Fields missing from older files fall back to serde defaults.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::timestamp::{serde_opt_timestamp, serde_timestamp};

// ═══════════════════════════════════════════════════════════════════════════════
// Category
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Category {
    Software,
    Connectivity,
    Hardware,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Software,
        Category::Connectivity,
        Category::Hardware,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Software => "software",
            Category::Connectivity => "connectivity",
            Category::Hardware => "hardware",
            Category::Other => "other",
        }
    }

    /// Lenient parse: anything unrecognized is `Other`.
    pub fn from_input(raw: &str) -> Self {
        raw.parse().unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "software" | "1" => Ok(Category::Software),
            "connectivity" | "2" => Ok(Category::Connectivity),
            "hardware" | "3" => Ok(Category::Hardware),
            "other" | "4" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::from_input(&raw)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tickets & Notes
// ═══════════════════════════════════════════════════════════════════════════════

/// Prefix the link field carries on disk when a link was supplied.
pub const TICKET_LINK_PREFIX: &str = "LINK: ";

/// Older files list tickets as bare strings; both shapes read as a [`Ticket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredTicket")]
pub struct Ticket {
    pub number: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTicket {
    Number(String),
    Full {
        number: String,
        #[serde(default)]
        link: String,
    },
}

impl From<StoredTicket> for Ticket {
    fn from(stored: StoredTicket) -> Self {
        match stored {
            StoredTicket::Number(number) => Ticket {
                number,
                link: String::new(),
            },
            StoredTicket::Full { number, link } => Ticket { number, link },
        }
    }
}

impl Ticket {
    /// Builds a ticket from raw operator input. A blank link stays empty.
    pub fn from_input(number: &str, link: &str) -> Self {
        let link = link.trim();
        Ticket {
            number: number.trim().to_string(),
            link: if link.is_empty() {
                String::new()
            } else {
                format!("{TICKET_LINK_PREFIX}{link}")
            },
        }
    }

    /// The link without its storage prefix, if one was recorded.
    pub fn url(&self) -> Option<&str> {
        if self.link.is_empty() {
            return None;
        }
        Some(
            self.link
                .strip_prefix(TICKET_LINK_PREFIX)
                .unwrap_or(&self.link),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub content: String,
    #[serde(with = "serde_timestamp")]
    pub timestamp: NaiveDateTime,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Blockers
// ═══════════════════════════════════════════════════════════════════════════════

/// A blocker that is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBlocker {
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(with = "serde_timestamp")]
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl ActiveBlocker {
    pub fn started_on(&self, day: NaiveDate) -> bool {
        self.start_time.date() == day
    }
}

/// A blocker that has been ended and moved into history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedBlocker {
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(with = "serde_timestamp")]
    pub start_time: NaiveDateTime,
    #[serde(with = "serde_timestamp")]
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl CompletedBlocker {
    pub fn started_on(&self, day: NaiveDate) -> bool {
        self.start_time.date() == day
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session Info
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub pack_operator: String,
    #[serde(default)]
    pub support_operator: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub pack_number: String,
    #[serde(default)]
    pub key_used: String,
    #[serde(default)]
    pub glove_number: String,
    #[serde(default)]
    pub dongle_number: String,
    #[serde(default)]
    pub phone_id: String,
    pub date: NaiveDate,
    #[serde(with = "serde_timestamp")]
    pub initialized_at: NaiveDateTime,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Document
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything persisted for one store key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub blockers: Vec<CompletedBlocker>,
    #[serde(default)]
    pub current_blocker: Option<ActiveBlocker>,
    #[serde(default, with = "serde_opt_timestamp")]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub session_info: Option<SessionInfo>,
}

impl Document {
    pub fn is_active(&self) -> bool {
        self.current_blocker.is_some()
    }

    /// Completed blockers that started on `day`, in insertion order.
    pub fn blockers_on(&self, day: NaiveDate) -> impl Iterator<Item = &CompletedBlocker> {
        self.blockers.iter().filter(move |b| b.started_on(day))
    }
}
