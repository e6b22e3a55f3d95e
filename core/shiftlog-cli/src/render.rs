//! Plain-text rendering of tracker state and reports.
//!
//! Every function builds a `String` so output can be asserted in tests.

use std::fmt::Write;

use shiftlog_core::analytics::Analytics;
use shiftlog_core::format::{format_minutes, preview, ticket_labels};
use shiftlog_core::report::ActiveEntry;
use shiftlog_core::timestamp::format_timestamp;
use shiftlog_core::{
    ActiveBlocker, CompletedBlocker, EodReport, Note, RecoveryNotice, SessionInfo, Ticket,
    TodaySummary,
};

const SUMMARY_NOTE_PREVIEW: usize = 60;
const RULE: &str = "==================================================";

pub fn notices(notices: &[RecoveryNotice]) -> String {
    let mut out = String::new();
    for notice in notices {
        match notice {
            RecoveryNotice::ActiveBlocker {
                description,
                start_time,
            } => {
                let _ = writeln!(
                    out,
                    "Recovered session with active blocker: '{}' (started {})",
                    description,
                    format_timestamp(start_time)
                );
            }
            RecoveryNotice::NewDay { previous_date } => {
                let _ = writeln!(
                    out,
                    "New day detected. Previous session was {previous_date}; run `shiftlog session` to update it."
                );
            }
        }
    }
    out
}

pub fn blocker_started(blocker: &ActiveBlocker) -> String {
    format!(
        "Started '{}' blocker: '{}' at {}",
        blocker.category,
        blocker.description,
        format_timestamp(&blocker.start_time)
    )
}

pub fn blocker_ended(blocker: &CompletedBlocker) -> String {
    format!(
        "Ended blocker: '{}'\n   Duration: {} ({} minutes)",
        blocker.description,
        format_minutes(blocker.duration_minutes),
        blocker.duration_minutes
    )
}

pub fn status(current: Option<&ActiveBlocker>, elapsed_minutes: i64) -> String {
    let Some(blocker) = current else {
        return "No active blocker.".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(out, "ACTIVE [{}]: {}", blocker.category, blocker.description);
    let _ = writeln!(
        out,
        "   Started: {} (running {} minutes)",
        format_timestamp(&blocker.start_time),
        elapsed_minutes
    );
    write_tickets_and_notes(&mut out, &blocker.tickets, &blocker.notes, "   ");
    out.trim_end().to_string()
}

pub fn summary(summary: &TodaySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Today's Summary ({})", summary.date);
    let _ = writeln!(out, "========================================");

    if summary.is_empty() {
        let _ = writeln!(out, "No blockers recorded today.");
        return out;
    }

    for (i, blocker) in summary.completed.iter().enumerate() {
        let _ = writeln!(out, "{}. [{}] {}", i + 1, blocker.category, blocker.description);
        let _ = writeln!(
            out,
            "   {} → {} ({})",
            format_timestamp(&blocker.start_time),
            format_timestamp(&blocker.end_time),
            format_minutes(blocker.duration_minutes)
        );
        write_tickets_and_notes(&mut out, &blocker.tickets, &blocker.notes, "   ");
    }

    if let Some(ActiveEntry {
        blocker,
        elapsed_minutes,
    }) = &summary.active
    {
        let _ = writeln!(out, "= ACTIVE: {}", blocker.description);
        let _ = writeln!(
            out,
            "   Started: {} (running {} minutes)",
            format_timestamp(&blocker.start_time),
            elapsed_minutes
        );
        write_tickets_and_notes(&mut out, &blocker.tickets, &blocker.notes, "   ");
    }

    let _ = writeln!(
        out,
        "\nTotal blocker time today: {} ({} minutes)",
        format_minutes(summary.total_minutes),
        summary.total_minutes
    );
    out
}

fn write_tickets_and_notes(out: &mut String, tickets: &[Ticket], notes: &[Note], indent: &str) {
    if !tickets.is_empty() {
        let _ = writeln!(out, "{indent}Tickets: {}", ticket_labels(tickets).join(", "));
    }
    if !notes.is_empty() {
        let _ = writeln!(out, "{indent}Notes ({}):", notes.len());
        for (j, note) in notes.iter().enumerate() {
            let _ = writeln!(
                out,
                "{indent}   {}. {} ({})",
                j + 1,
                preview(&note.content, SUMMARY_NOTE_PREVIEW),
                format_timestamp(&note.timestamp)
            );
        }
    }
}

fn write_session_info(out: &mut String, info: &SessionInfo) {
    let or_na = |s: &str| if s.is_empty() { "N/A".to_string() } else { s.to_string() };
    let _ = writeln!(out, "Session Information:");
    let _ = writeln!(out, "  Pack Operator: {}", or_na(&info.pack_operator));
    let _ = writeln!(out, "  Support Operator: {}", or_na(&info.support_operator));
    let _ = writeln!(out, "  Location: {}", or_na(&info.location));
    let _ = writeln!(out, "  Pack Number: {}", or_na(&info.pack_number));
    let _ = writeln!(out, "  Key Used: {}", or_na(&info.key_used));
    let _ = writeln!(out, "  Glove #: {}", or_na(&info.glove_number));
    let _ = writeln!(out, "  Dongle #: {}", or_na(&info.dongle_number));
    let _ = writeln!(out, "  Phone ID: {}", or_na(&info.phone_id));
    let _ = writeln!(out, "  Session Date: {}", info.date);
    let _ = writeln!(out);
}

pub fn eod_report(report: &EodReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "End of Day Report - {}", report.date);
    let _ = writeln!(out, "{RULE}");

    if let Some(info) = &report.session_info {
        write_session_info(&mut out, info);
    }

    if !report.has_blockers() {
        let _ = writeln!(out, "No blockers encountered today!");
    } else {
        let _ = writeln!(out, "Blockers encountered: {}", report.blocker_count());
        let _ = writeln!(out, "Total time blocked: {}", format_minutes(report.total_minutes));

        let _ = writeln!(out, "\nBy category:");
        for row in &report.categories {
            let _ = writeln!(
                out,
                "  {:<13} {:>3}  {}",
                row.category.as_str(),
                row.count,
                format_minutes(row.total_minutes)
            );
        }

        let _ = writeln!(out, "\nDetailed breakdown:");
        for (i, blocker) in report.blockers.iter().enumerate() {
            let _ = writeln!(out, "  {}. [{}] {}", i + 1, blocker.category, blocker.description);
            let _ = writeln!(
                out,
                "     Time: {} → {}",
                format_timestamp(&blocker.start_time),
                format_timestamp(&blocker.end_time)
            );
            let _ = writeln!(out, "     Duration: {}", format_minutes(blocker.duration_minutes));
            for ticket in &blocker.tickets {
                match ticket.url() {
                    Some(url) => {
                        let _ = writeln!(out, "     Ticket: {} ({url})", ticket.number);
                    }
                    None => {
                        let _ = writeln!(out, "     Ticket: {}", ticket.number);
                    }
                }
            }
            if !blocker.notes.is_empty() {
                let _ = writeln!(out, "     Notes ({}):", blocker.notes.len());
                for (j, note) in blocker.notes.iter().enumerate() {
                    let _ = writeln!(
                        out,
                        "       {}. [{}] {}",
                        j + 1,
                        format_timestamp(&note.timestamp),
                        note.content
                    );
                }
            }
            let _ = writeln!(out);
        }
    }

    if let Some(active) = &report.unresolved {
        let _ = writeln!(
            out,
            "\nWarning: Active blocker still running: '{}' ({} minutes so far)",
            active.blocker.description, active.elapsed_minutes
        );
    }
    out
}

pub fn analytics(analytics: &Analytics) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Manager Analytics ({} to {})",
        analytics.start_date, analytics.end_date
    );
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Total blockers: {}", analytics.total_blockers);
    let _ = writeln!(
        out,
        "Total downtime: {}",
        format_minutes(analytics.total_downtime_minutes)
    );
    let _ = writeln!(
        out,
        "Average resolution: {:.1} minutes",
        analytics.avg_resolution_minutes
    );
    let active = if analytics.active_operators.is_empty() {
        "none".to_string()
    } else {
        analytics.active_operators.join(", ")
    };
    let _ = writeln!(out, "Active operators: {active}");

    let _ = writeln!(out, "\nDaily:");
    let _ = writeln!(out, "  {:<10}  {:>5}  {:>8}  {:>6}", "date", "count", "blocked", "eff%");
    for day in &analytics.days {
        let _ = writeln!(
            out,
            "  {}  {:>5}  {:>8}  {:>6.1}",
            day.date,
            day.blocker_count,
            format_minutes(day.total_minutes),
            day.efficiency
        );
    }

    if !analytics.top_categories.is_empty() {
        let _ = writeln!(out, "\nTop categories:");
        for (i, cat) in analytics.top_categories.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} - {} blockers, {} (avg {:.1} min)",
                i + 1,
                cat.category,
                cat.count,
                format_minutes(cat.total_minutes),
                cat.avg_resolution_minutes
            );
        }
    }

    if !analytics.operators.is_empty() {
        let _ = writeln!(out, "\nOperators:");
        for op in &analytics.operators {
            let _ = writeln!(
                out,
                "  {:<20} {:>3} blockers  {:>8}  {:>5.1}%",
                op.operator,
                op.blocker_count,
                format_minutes(op.total_minutes),
                op.overall_efficiency
            );
        }
    }
    out
}
