//! Subcommand handlers.
//!
//! Each handler opens a fresh tracker (one read-modify-write per command) and
//! returns the text to print, so the whole command surface can be exercised
//! against a temporary data root.

use std::fmt::Write;

use serde::Serialize;
use shiftlog_core::analytics::analytics_for;
use shiftlog_core::timestamp::elapsed_minutes;
use shiftlog_core::{
    load_config, save_config, AnalyticsOptions, BlockerTracker, Category, Clock, NewTicket, Result,
    SessionContext, SessionFields, ShiftConfig, ShiftError, StorageConfig, SystemClock,
};

use crate::active_session::{self, ActiveSession};
use crate::render;

/// The typed phrase `clear` requires before wiping data.
pub const CLEAR_CONFIRMATION: &str = "YES";

/// Settings to change with `shiftlog config`; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub shift_minutes: Option<u32>,
    pub analytics_days: Option<u32>,
    pub active_lookback_days: Option<u32>,
    pub lock_timeout_ms: Option<u64>,
}

impl ConfigUpdate {
    /// Writes the given values into `config`; true if anything changed.
    fn apply(self, config: &mut ShiftConfig) -> bool {
        let changes = [
            replace(&mut config.shift_minutes, self.shift_minutes),
            replace(&mut config.analytics_days, self.analytics_days),
            replace(&mut config.active_lookback_days, self.active_lookback_days),
            replace(&mut config.lock_timeout_ms, self.lock_timeout_ms),
        ];
        changes.contains(&true)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

pub struct App<C: Clock = SystemClock> {
    storage: StorageConfig,
    config: ShiftConfig,
    session: ActiveSession,
    force_test_mode: bool,
    clock: C,
}

impl App<SystemClock> {
    pub fn load(storage: StorageConfig, force_test_mode: bool) -> Self {
        Self::with_clock(storage, force_test_mode, SystemClock)
    }
}

impl<C: Clock> App<C> {
    pub fn with_clock(storage: StorageConfig, force_test_mode: bool, clock: C) -> Self {
        let config = load_config(&storage);
        let session = active_session::load(&storage);
        Self {
            storage,
            config,
            session,
            force_test_mode,
            clock,
        }
    }

    fn context(&self) -> SessionContext {
        self.session
            .context(self.storage.clone(), self.force_test_mode)
    }

    fn tracker(&self) -> BlockerTracker<&C> {
        BlockerTracker::open(&self.context(), &self.config, &self.clock)
    }

    pub fn session(&mut self, fields: SessionFields) -> Result<String> {
        let info = fields.clone().into_session_info(self.clock.now());
        let ctx = self.context().with_session_info(Some(info));
        let mut tracker = BlockerTracker::open(&ctx, &self.config, &self.clock);
        let info = tracker.set_session_info(fields)?;

        self.session.session_info = Some(info);
        active_session::save(&self.storage, &self.session)?;

        let mut out = String::from("Session information saved!");
        if let Some(path) = tracker.store_path() {
            let _ = write!(out, "\nData file: {}", path.display());
        }
        Ok(out)
    }

    pub fn status(&self) -> String {
        let tracker = self.tracker();
        let elapsed = tracker
            .current_blocker()
            .map_or(0, |b| elapsed_minutes(&b.start_time, &self.clock.now()).max(0));

        let mut out = render::notices(tracker.notices());
        out.push_str(&render::status(tracker.current_blocker(), elapsed));
        let ctx = self.context();
        match &ctx.session_info {
            Some(info) => {
                let _ = write!(
                    out,
                    "\nOperators: {} / {}",
                    or_dash(&info.pack_operator),
                    or_dash(&info.support_operator)
                );
            }
            None => out.push_str("\nNo session set; run `shiftlog session` first."),
        }
        if ctx.test_mode {
            out.push_str("\nTEST MODE ACTIVATED");
        }
        if let Some(path) = tracker.store_path() {
            let _ = write!(out, "\nData file: {}", path.display());
        }
        if let Some(path) = tracker.carryover_path() {
            let _ = write!(out, "\nRunning blocker stored in: {}", path.display());
        }
        out
    }

    pub fn start(
        &self,
        description: &str,
        category: Option<&str>,
        ticket: Option<&str>,
        link: &str,
    ) -> Result<String> {
        let category = category.map_or(Category::Other, Category::from_input);
        let ticket = ticket.map(|number| NewTicket::new(number, link));

        let mut tracker = self.tracker();
        let blocker = tracker.start(description, category, ticket)?;
        Ok(render::blocker_started(&blocker))
    }

    pub fn end(&self) -> Result<String> {
        let completed = self.tracker().end()?;
        Ok(render::blocker_ended(&completed))
    }

    pub fn ticket(&self, number: &str, link: &str) -> Result<String> {
        let mut tracker = self.tracker();
        let ticket = tracker.add_ticket(number, link)?;
        let all = tracker
            .current_blocker()
            .map(|b| shiftlog_core::format::ticket_labels(&b.tickets).join(", "))
            .unwrap_or_default();
        Ok(format!(
            "Ticket {} added to current blocker!\nAll tickets for this blocker: {all}",
            ticket.number
        ))
    }

    pub fn note(&self, content: &str) -> Result<String> {
        let note = self.tracker().add_note(content)?;
        Ok(format!(
            "Note added to current blocker at {}\nPreview: {}",
            shiftlog_core::timestamp::format_timestamp(&note.timestamp),
            shiftlog_core::format::preview(&note.content, 50)
        ))
    }

    pub fn summary(&self, json: bool) -> Result<String> {
        self.context().require_pack_operator()?;
        let tracker = self.tracker();
        let summary = tracker.todays_summary();
        if json {
            return to_json(&summary);
        }
        Ok(render::notices(tracker.notices()) + &render::summary(&summary))
    }

    pub fn report(&self, json: bool) -> Result<String> {
        self.context().require_pack_operator()?;
        let tracker = self.tracker();
        let report = tracker.eod_report();
        if json {
            return to_json(&report);
        }
        Ok(render::notices(tracker.notices()) + &render::eod_report(&report))
    }

    pub fn analytics(&self, days: Option<u32>, json: bool) -> Result<String> {
        let mut options = AnalyticsOptions::from(&self.config);
        if let Some(days) = days {
            options.window_days = days;
        }
        let analytics = analytics_for(&self.context(), self.clock.today(), &options);
        if json {
            return to_json(&analytics);
        }
        Ok(render::analytics(&analytics))
    }

    pub fn clear(&self, confirm: Option<&str>) -> Result<String> {
        if confirm != Some(CLEAR_CONFIRMATION) {
            return Ok("Clear operation cancelled.".to_string());
        }
        self.tracker().clear_all()?;
        Ok("All data cleared successfully.".to_string())
    }

    /// Sets test mode, or flips it when `enabled` is `None`.
    pub fn test_mode(&mut self, enabled: Option<bool>) -> Result<String> {
        let enabled = enabled.unwrap_or(!self.session.test_mode);
        self.session.test_mode = enabled;
        active_session::save(&self.storage, &self.session)?;
        tracing::info!(enabled, "Test mode changed");
        Ok(format!(
            "Test mode {}",
            if enabled { "enabled" } else { "disabled" }
        ))
    }

    /// Prints the settings, saving them first when `update` changes any.
    pub fn config(&mut self, update: ConfigUpdate) -> Result<String> {
        let mut out = String::new();
        if update.apply(&mut self.config) {
            save_config(&self.storage, &self.config)?;
            tracing::info!(config = ?self.config, "Configuration saved");
            let _ = writeln!(
                out,
                "Configuration saved to {}",
                self.storage.config_file().display()
            );
        }
        out.push_str(&to_json(&self.config)?);
        Ok(out)
    }

    pub fn paths(&self) -> String {
        let ctx = self.context();
        let mut out = String::new();
        let _ = writeln!(out, "Data root:  {}", self.storage.root().display());
        let _ = writeln!(out, "Data dir:   {}", ctx.data_dir().display());
        let _ = writeln!(out, "Store file: {}", ctx.store_path(self.clock.today()).display());
        let _ = writeln!(out, "Config:     {}", self.storage.config_file().display());
        let _ = write!(out, "Logs:       {}", self.storage.logs_dir().display());
        out
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ShiftError::Json {
        context: "rendering JSON output".to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime};
    use shiftlog_core::timestamp::parse_timestamp;
    use shiftlog_core::{load_document, ManualClock};
    use tempfile::tempdir;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn app(root: &std::path::Path, now: &str) -> App<ManualClock> {
        App::with_clock(
            StorageConfig::with_root(root.to_path_buf()),
            false,
            ManualClock::new(ts(now)),
        )
    }

    fn jane() -> SessionFields {
        SessionFields {
            pack_operator: "Jane Doe".to_string(),
            support_operator: "Bob".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_session_saves_pointer_and_document() {
        let temp = tempdir().unwrap();
        let mut app = app(temp.path(), "2024-03-01 08:00:00");

        let out = app.session(jane()).unwrap();
        assert!(out.contains("Jane-Doe_Bob_eod_data_2024-03-01.json"));

        let pointer = active_session::load(&StorageConfig::with_root(temp.path().to_path_buf()));
        assert_eq!(pointer.session_info.unwrap().pack_operator, "Jane Doe");

        let doc = load_document(
            &temp
                .path()
                .join("production/Jane-Doe_Bob_eod_data_2024-03-01.json"),
        );
        assert_eq!(doc.session_info.unwrap().support_operator, "Bob");
    }

    #[test]
    fn test_reports_require_pack_operator() {
        let temp = tempdir().unwrap();
        let app = app(temp.path(), "2024-03-01 08:00:00");

        assert!(matches!(
            app.summary(false),
            Err(ShiftError::MissingRequiredSessionField("pack_operator"))
        ));
        assert!(app.report(false).is_err());
        assert!(app.analytics(None, false).is_ok());
    }

    #[test]
    fn test_blocker_flow_across_commands() {
        let temp = tempdir().unwrap();
        let mut first = app(temp.path(), "2024-03-01 09:00:00");
        first.session(jane()).unwrap();
        first
            .start("printer jam", Some("hardware"), Some("TCK-1"), "http://x")
            .unwrap();

        // A later invocation reloads the pointer and sees the running blocker.
        let later = app(temp.path(), "2024-03-01 09:45:30");
        assert!(later.status().contains("ACTIVE [hardware]: printer jam"));
        later.note("reloaded paper").unwrap();
        let out = later.end().unwrap();
        assert!(out.contains("(45 minutes)"));

        let summary = later.summary(false).unwrap();
        assert!(summary.contains("Tickets: TCK-1"));
        let report = later.report(false).unwrap();
        assert!(report.contains("Ticket: TCK-1 (http://x)"));
    }

    #[test]
    fn test_domain_errors_are_expected() {
        let temp = tempdir().unwrap();
        let app = app(temp.path(), "2024-03-01 09:00:00");

        let err = app.end().unwrap_err();
        assert!(err.is_expected());
        let err = app.start("  ", None, None, "").unwrap_err();
        assert!(err.is_expected());
        app.start("jam", None, None, "").unwrap();
        let err = app.start("jam again", None, None, "").unwrap_err();
        assert!(matches!(err, ShiftError::AlreadyActive { .. }));
    }

    #[test]
    fn test_blocker_ended_after_midnight_by_next_command() {
        let temp = tempdir().unwrap();
        let mut evening = app(temp.path(), "2024-03-01 23:50:00");
        evening.session(jane()).unwrap();
        evening.start("overnight outage", None, None, "").unwrap();

        let morning = app(temp.path(), "2024-03-02 00:10:00");
        let status = morning.status();
        assert!(status.contains("New day detected. Previous session was 2024-03-01"));
        assert!(status.contains("ACTIVE [other]: overnight outage"));
        assert!(status.contains("Jane-Doe_Bob_eod_data_2024-03-01.json"));

        let out = morning.end().unwrap();
        assert!(out.contains("(20 minutes)"));
        assert!(morning.status().contains("No active blocker."));
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let temp = tempdir().unwrap();
        let app = app(temp.path(), "2024-03-01 09:00:00");
        app.start("jam", None, None, "").unwrap();

        assert_eq!(app.clear(Some("yes")).unwrap(), "Clear operation cancelled.");
        assert!(app.status().contains("ACTIVE"));

        assert_eq!(app.clear(Some("YES")).unwrap(), "All data cleared successfully.");
        assert!(app.status().contains("No active blocker."));
    }

    #[test]
    fn test_test_mode_toggle_routes_to_test_store() {
        let temp = tempdir().unwrap();
        let mut app = app(temp.path(), "2024-03-01 09:00:00");

        assert_eq!(app.test_mode(None).unwrap(), "Test mode enabled");
        app.start("practice", None, None, "").unwrap();
        assert!(temp.path().join("test/test_data.json").exists());
        assert!(app.paths().contains("test_data.json"));

        let reloaded = self::app(temp.path(), "2024-03-01 09:05:00");
        assert!(reloaded.status().contains("TEST MODE"));

        assert_eq!(app.test_mode(Some(false)).unwrap(), "Test mode disabled");
    }

    #[test]
    fn test_config_update_is_saved_and_used() {
        let temp = tempdir().unwrap();
        let mut app = app(temp.path(), "2024-03-08 09:00:00");

        let out = app.config(ConfigUpdate::default()).unwrap();
        assert!(!out.contains("Configuration saved"));
        assert!(!temp.path().join("config.json").exists());

        let out = app
            .config(ConfigUpdate {
                shift_minutes: Some(600),
                analytics_days: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert!(out.starts_with("Configuration saved to"));

        let reloaded = self::app(temp.path(), "2024-03-08 09:00:00");
        assert_eq!(reloaded.config.shift_minutes, 600);
        assert_eq!(reloaded.config.analytics_days, 2);
        assert_eq!(reloaded.config.lock_timeout_ms, 2000);

        let value: serde_json::Value =
            serde_json::from_str(&reloaded.analytics(None, true).unwrap()).unwrap();
        assert_eq!(value["days"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_test_mode_analytics_reads_test_store() {
        let temp = tempdir().unwrap();
        let mut app = app(temp.path(), "2024-03-08 09:00:00");
        app.test_mode(Some(true)).unwrap();
        app.start("practice", Some("hardware"), None, "").unwrap();
        app.clock.advance(Duration::minutes(48));
        app.end().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&app.analytics(None, true).unwrap()).unwrap();
        assert_eq!(value["total_blockers"], 1);
        assert_eq!(value["active_operators"], serde_json::json!(["TEST"]));
    }

    #[test]
    fn test_summary_json_output() {
        let temp = tempdir().unwrap();
        let mut app = app(temp.path(), "2024-03-01 09:00:00");
        app.session(jane()).unwrap();
        app.start("jam", Some("2"), None, "").unwrap();
        app.clock.advance(Duration::minutes(5));

        let value: serde_json::Value = serde_json::from_str(&app.summary(true).unwrap()).unwrap();
        assert_eq!(value["total_minutes"], 5);
        assert_eq!(value["active"]["blocker"]["category"], "connectivity");
    }
}
