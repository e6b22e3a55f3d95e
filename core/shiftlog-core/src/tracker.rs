//! Blocker lifecycle tracker.
//!
//! ## State Machine
//!
//! ```text
//! Idle   --start-->      Active
//! Active --add_ticket--> Active
//! Active --add_note-->   Active
//! Active --end-->        Idle    (blocker appended to history)
//! any    --clear_all-->  Idle    (history wiped)
//! ```
//!
//! Every mutating call is one read-modify-write of the bound store and is
//! persisted before it returns. A failing call changes nothing.
//!
//! An active blocker survives process restarts; opening a tracker reports it
//! as a [`RecoveryNotice`] instead of closing it.
//!
//! ## Midnight
//!
//! A blocker belongs to the day it started. When today's store is idle,
//! [`BlockerTracker::open`] also binds yesterday's store for the same operators
//! if a blocker is still running there. Ticket, note and end calls then go to
//! that store, so the blocker is closed in the file it was started in.

use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use crate::clock::{Clock, SystemClock};
use crate::config::ShiftConfig;
use crate::error::{InputField, Result, ShiftError};
use crate::report::{eod_report, todays_summary, EodReport, TodaySummary};
use crate::session::{SessionContext, SessionFields};
use crate::store::DocumentStore;
use crate::timestamp::{elapsed_minutes, format_timestamp};
use crate::types::{
    ActiveBlocker, Category, CompletedBlocker, Document, Note, SessionInfo, Ticket,
};

/// A ticket to attach while starting a blocker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub number: String,
    pub link: String,
}

impl NewTicket {
    pub fn new(number: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            link: link.into(),
        }
    }
}

/// Something the operator should know about right after opening a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryNotice {
    /// A blocker was left running by an earlier session.
    ActiveBlocker {
        description: String,
        start_time: NaiveDateTime,
    },
    /// Session info on file belongs to an earlier day; the caller may ask for fresh details.
    NewDay { previous_date: NaiveDate },
}

pub struct BlockerTracker<C: Clock = SystemClock> {
    store: DocumentStore,
    /// Yesterday's store, bound only while it holds a running blocker.
    carryover: Option<DocumentStore>,
    /// Day the operator last entered session details, when known.
    session_date: Option<NaiveDate>,
    clock: C,
    notices: Vec<RecoveryNotice>,
}

impl BlockerTracker<SystemClock> {
    /// Opens the store for `ctx` on today's date using the system clock.
    pub fn open_today(ctx: &SessionContext, config: &ShiftConfig) -> Self {
        Self::open(ctx, config, SystemClock)
    }
}

impl<C: Clock> BlockerTracker<C> {
    pub fn open(ctx: &SessionContext, config: &ShiftConfig, clock: C) -> Self {
        let today = clock.today();
        let lock_timeout = Duration::from_millis(config.lock_timeout_ms);
        let path = ctx.store_path(today);
        tracing::debug!(path = %path.display(), test_mode = ctx.test_mode, "Opening store");
        let store = DocumentStore::load(&path).with_lock_timeout(lock_timeout);

        let carryover = if ctx.test_mode || store.document().is_active() {
            None
        } else {
            today
                .pred_opt()
                .map(|yesterday| {
                    DocumentStore::load(&ctx.store_path(yesterday)).with_lock_timeout(lock_timeout)
                })
                .filter(|previous| previous.document().is_active())
        };

        let session_date = ctx.session_info.as_ref().map(|info| info.date);
        Self::assemble(store, carryover, session_date, clock)
    }

    pub fn with_store(store: DocumentStore, clock: C) -> Self {
        Self::assemble(store, None, None, clock)
    }

    fn assemble(
        store: DocumentStore,
        carryover: Option<DocumentStore>,
        session_date: Option<NaiveDate>,
        clock: C,
    ) -> Self {
        let mut tracker = BlockerTracker {
            store,
            carryover,
            session_date,
            clock,
            notices: Vec::new(),
        };
        tracker.notices = tracker.recover_on_startup();
        tracker
    }

    /// Inspects the loaded document for a surviving blocker or a stale session day.
    ///
    /// Nothing is modified; the notices are logged and returned.
    pub fn recover_on_startup(&self) -> Vec<RecoveryNotice> {
        let mut notices = Vec::new();

        let session_date = self.session_date.or_else(|| {
            self.store
                .document()
                .session_info
                .as_ref()
                .map(|info| info.date)
        });
        if let Some(previous_date) = session_date.filter(|date| *date != self.clock.today()) {
            tracing::info!(%previous_date, "New day detected");
            notices.push(RecoveryNotice::NewDay { previous_date });
        }

        if let Some(current) = self.current_blocker() {
            tracing::info!(
                description = %current.description,
                started = %format_timestamp(&current.start_time),
                "Recovered session with active blocker"
            );
            notices.push(RecoveryNotice::ActiveBlocker {
                description: current.description.clone(),
                start_time: current.start_time,
            });
        }

        notices
    }

    /// Notices gathered when this tracker was opened.
    pub fn notices(&self) -> &[RecoveryNotice] {
        &self.notices
    }

    pub fn document(&self) -> &Document {
        self.store.document()
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store.path()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Path of yesterday's store while a blocker started there is still running.
    pub fn carryover_path(&self) -> Option<&Path> {
        self.carried_blocker()
            .and(self.carryover.as_ref())
            .and_then(|store| store.path())
    }

    pub fn is_active(&self) -> bool {
        self.current_blocker().is_some()
    }

    /// The running blocker, including one carried over from yesterday.
    pub fn current_blocker(&self) -> Option<&ActiveBlocker> {
        self.document()
            .current_blocker
            .as_ref()
            .or_else(|| self.carried_blocker())
    }

    fn carried_blocker(&self) -> Option<&ActiveBlocker> {
        self.carryover
            .as_ref()
            .and_then(|store| store.document().current_blocker.as_ref())
    }

    /// The store that owns the running blocker.
    fn active_store(&mut self) -> &mut DocumentStore {
        match &mut self.carryover {
            Some(previous)
                if !self.store.document().is_active() && previous.document().is_active() =>
            {
                previous
            }
            _ => &mut self.store,
        }
    }

    /// Today's document as reports should see it, with a carried-over blocker
    /// shown as the running one.
    fn report_document(&self) -> Cow<'_, Document> {
        match self.carried_blocker() {
            Some(carried) if !self.document().is_active() => {
                let mut doc = self.document().clone();
                doc.current_blocker = Some(carried.clone());
                Cow::Owned(doc)
            }
            _ => Cow::Borrowed(self.document()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Idle → Active. An optional ticket is attached in the same write.
    pub fn start(
        &mut self,
        description: &str,
        category: Category,
        ticket: Option<NewTicket>,
    ) -> Result<ActiveBlocker> {
        let now = self.clock.now();
        let description = description.trim();
        if let Some(carried) = self.carried_blocker() {
            return Err(already_active(carried));
        }

        let blocker = self.store.transact(|doc| {
            if let Some(current) = &doc.current_blocker {
                return Err(already_active(current));
            }
            if description.is_empty() {
                return Err(ShiftError::EmptyInput(InputField::Description));
            }
            let tickets = match &ticket {
                Some(t) if t.number.trim().is_empty() => {
                    return Err(ShiftError::EmptyInput(InputField::TicketNumber))
                }
                Some(t) => vec![Ticket::from_input(&t.number, &t.link)],
                None => Vec::new(),
            };

            let blocker = ActiveBlocker {
                description: description.to_string(),
                category,
                start_time: now,
                tickets,
                notes: Vec::new(),
            };
            doc.current_blocker = Some(blocker.clone());
            doc.last_updated = Some(now);
            Ok(blocker)
        })?;

        tracing::info!(
            category = %blocker.category,
            description = %blocker.description,
            started = %format_timestamp(&blocker.start_time),
            "Blocker started"
        );
        Ok(blocker)
    }

    /// Active → Idle, moving the blocker into history.
    pub fn end(&mut self) -> Result<CompletedBlocker> {
        let now = self.clock.now();

        let completed = self.active_store().transact(|doc| {
            let current = doc
                .current_blocker
                .take()
                .ok_or(ShiftError::NoActiveBlocker)?;
            let completed = complete_blocker(current, now);
            doc.blockers.push(completed.clone());
            doc.last_updated = Some(now);
            Ok(completed)
        })?;

        tracing::info!(
            description = %completed.description,
            duration_minutes = completed.duration_minutes,
            "Blocker ended"
        );
        Ok(completed)
    }

    pub fn add_ticket(&mut self, number: &str, link: &str) -> Result<Ticket> {
        let now = self.clock.now();

        let ticket = self.active_store().transact(|doc| {
            let current = doc
                .current_blocker
                .as_mut()
                .ok_or(ShiftError::NoActiveBlocker)?;
            if number.trim().is_empty() {
                return Err(ShiftError::EmptyInput(InputField::TicketNumber));
            }
            let ticket = Ticket::from_input(number, link);
            current.tickets.push(ticket.clone());
            doc.last_updated = Some(now);
            Ok(ticket)
        })?;

        tracing::info!(ticket = %ticket.number, "Ticket added to current blocker");
        Ok(ticket)
    }

    pub fn add_note(&mut self, content: &str) -> Result<Note> {
        let now = self.clock.now();
        let content = content.trim();

        let note = self.active_store().transact(|doc| {
            let current = doc
                .current_blocker
                .as_mut()
                .ok_or(ShiftError::NoActiveBlocker)?;
            if content.is_empty() {
                return Err(ShiftError::EmptyInput(InputField::Note));
            }
            let note = Note {
                content: content.to_string(),
                timestamp: now,
            };
            current.notes.push(note.clone());
            doc.last_updated = Some(now);
            Ok(note)
        })?;

        tracing::info!(chars = note.content.chars().count(), "Note added to current blocker");
        Ok(note)
    }

    /// Resets the store to an empty document. Confirmation is the caller's job.
    ///
    /// A blocker carried over from yesterday is discarded too; yesterday's
    /// history stays.
    pub fn clear_all(&mut self) -> Result<()> {
        self.store.transact(|doc| {
            *doc = Document::default();
            Ok(())
        })?;
        if let Some(previous) = self.carryover.as_mut() {
            previous.transact(|doc| {
                doc.current_blocker = None;
                Ok(())
            })?;
        }
        tracing::warn!("All tracker data cleared");
        Ok(())
    }

    /// Stamps and records session info in the bound document.
    ///
    /// History is not migrated; a changed operator token only affects which
    /// file later trackers open.
    pub fn set_session_info(&mut self, fields: SessionFields) -> Result<SessionInfo> {
        let now = self.clock.now();
        let info = fields.into_session_info(now);

        self.store.transact(|doc| {
            doc.session_info = Some(info.clone());
            doc.last_updated = Some(now);
            Ok(())
        })?;

        tracing::info!(
            pack_operator = %info.pack_operator,
            support_operator = %info.support_operator,
            "Session information saved"
        );
        Ok(info)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────

    pub fn todays_summary(&self) -> TodaySummary {
        todays_summary(&self.report_document(), self.clock.now())
    }

    pub fn eod_report(&self) -> EodReport {
        eod_report(&self.report_document(), self.clock.now())
    }
}

fn already_active(current: &ActiveBlocker) -> ShiftError {
    ShiftError::AlreadyActive {
        description: current.description.clone(),
        start_time: format_timestamp(&current.start_time),
    }
}

/// Closes `active` at `end_time`. A clock that ran backwards yields 0 minutes.
pub fn complete_blocker(active: ActiveBlocker, end_time: NaiveDateTime) -> CompletedBlocker {
    let elapsed = elapsed_minutes(&active.start_time, &end_time);
    if elapsed < 0 {
        tracing::warn!(
            start = %format_timestamp(&active.start_time),
            end = %format_timestamp(&end_time),
            "Blocker ended before it started; recording 0 minutes"
        );
    }

    CompletedBlocker {
        description: active.description,
        category: active.category,
        start_time: active.start_time,
        end_time,
        duration_minutes: elapsed.max(0),
        tickets: active.tickets,
        notes: active.notes,
    }
}
