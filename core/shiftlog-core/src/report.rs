//! Single-document reports: the running summary for today and the
//! end-of-day report.
//!
//! Blockers belong to the day their `start_time` falls on. Entries keep the
//! order in which they were recorded.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::timestamp::elapsed_minutes;
use crate::types::{ActiveBlocker, Category, CompletedBlocker, Document, SessionInfo};

/// The running blocker with its live elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveEntry {
    pub blocker: ActiveBlocker,
    pub elapsed_minutes: i64,
}

impl ActiveEntry {
    fn at(blocker: &ActiveBlocker, now: NaiveDateTime) -> Self {
        ActiveEntry {
            blocker: blocker.clone(),
            elapsed_minutes: elapsed_minutes(&blocker.start_time, &now).max(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodaySummary {
    pub date: NaiveDate,
    pub completed: Vec<CompletedBlocker>,
    pub active: Option<ActiveEntry>,
    /// Completed minutes plus the active blocker's elapsed minutes.
    pub total_minutes: i64,
}

impl TodaySummary {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.active.is_none()
    }
}

pub fn todays_summary(doc: &Document, now: NaiveDateTime) -> TodaySummary {
    let date = now.date();
    let completed: Vec<CompletedBlocker> = doc.blockers_on(date).cloned().collect();
    let active = doc
        .current_blocker
        .as_ref()
        .map(|b| ActiveEntry::at(b, now));

    let total_minutes = completed.iter().map(|b| b.duration_minutes).sum::<i64>()
        + active.as_ref().map_or(0, |a| a.elapsed_minutes);

    TodaySummary {
        date,
        completed,
        active,
        total_minutes,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub count: usize,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EodReport {
    pub date: NaiveDate,
    pub session_info: Option<SessionInfo>,
    pub blockers: Vec<CompletedBlocker>,
    pub total_minutes: i64,
    /// One row per category that occurred, in category order.
    pub categories: Vec<CategoryBreakdown>,
    /// Still running at report time; not counted in the totals.
    pub unresolved: Option<ActiveEntry>,
}

impl EodReport {
    /// False means "no blockers encountered today", which is a valid report.
    pub fn has_blockers(&self) -> bool {
        !self.blockers.is_empty()
    }

    pub fn blocker_count(&self) -> usize {
        self.blockers.len()
    }
}

pub fn eod_report(doc: &Document, now: NaiveDateTime) -> EodReport {
    let date = now.date();
    let blockers: Vec<CompletedBlocker> = doc.blockers_on(date).cloned().collect();
    let total_minutes = blockers.iter().map(|b| b.duration_minutes).sum();

    let mut by_category: BTreeMap<Category, CategoryBreakdown> = BTreeMap::new();
    for blocker in &blockers {
        let entry = by_category
            .entry(blocker.category)
            .or_insert_with(|| CategoryBreakdown {
                category: blocker.category,
                count: 0,
                total_minutes: 0,
            });
        entry.count += 1;
        entry.total_minutes += blocker.duration_minutes;
    }

    EodReport {
        date,
        session_info: doc.session_info.clone(),
        blockers,
        total_minutes,
        categories: by_category.into_values().collect(),
        unresolved: doc
            .current_blocker
            .as_ref()
            .map(|b| ActiveEntry::at(b, now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn completed(desc: &str, category: Category, start: &str, minutes: i64) -> CompletedBlocker {
        let start = ts(start);
        CompletedBlocker {
            description: desc.to_string(),
            category,
            start_time: start,
            end_time: start + chrono::Duration::minutes(minutes),
            duration_minutes: minutes,
            tickets: vec![],
            notes: vec![],
        }
    }

    fn active(desc: &str, start: &str) -> ActiveBlocker {
        ActiveBlocker {
            description: desc.to_string(),
            category: Category::Software,
            start_time: ts(start),
            tickets: vec![],
            notes: vec![],
        }
    }

    fn sample() -> Document {
        Document {
            blockers: vec![
                completed("yesterday", Category::Hardware, "2024-02-29 15:00:00", 30),
                completed("late scan", Category::Hardware, "2024-03-01 14:00:00", 20),
                completed("wifi", Category::Connectivity, "2024-03-01 09:00:00", 15),
                completed("jam", Category::Hardware, "2024-03-01 10:00:00", 5),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_filters_to_today_in_insertion_order() {
        let summary = todays_summary(&sample(), ts("2024-03-01 16:00:00"));
        let names: Vec<_> = summary
            .completed
            .iter()
            .map(|b| b.description.as_str())
            .collect();
        assert_eq!(names, vec!["late scan", "wifi", "jam"]);
        assert_eq!(summary.total_minutes, 40);
        assert!(summary.active.is_none());
    }

    #[test]
    fn test_summary_adds_live_minutes_of_active_blocker() {
        let mut doc = sample();
        doc.current_blocker = Some(active("server down", "2024-03-01 15:30:00"));

        let summary = todays_summary(&doc, ts("2024-03-01 16:00:59"));
        let entry = summary.active.as_ref().unwrap();
        assert_eq!(entry.elapsed_minutes, 30);
        assert_eq!(summary.total_minutes, 70);
    }

    #[test]
    fn test_summary_empty_day() {
        let summary = todays_summary(&Document::default(), ts("2024-03-01 16:00:00"));
        assert!(summary.is_empty());
        assert_eq!(summary.total_minutes, 0);
    }

    #[test]
    fn test_eod_report_category_breakdown() {
        let report = eod_report(&sample(), ts("2024-03-01 17:00:00"));
        assert!(report.has_blockers());
        assert_eq!(report.blocker_count(), 3);
        assert_eq!(report.total_minutes, 40);
        assert_eq!(
            report.categories,
            vec![
                CategoryBreakdown {
                    category: Category::Connectivity,
                    count: 1,
                    total_minutes: 15
                },
                CategoryBreakdown {
                    category: Category::Hardware,
                    count: 2,
                    total_minutes: 25
                },
            ]
        );
    }

    #[test]
    fn test_eod_report_no_blockers_is_not_an_error() {
        let report = eod_report(&sample(), ts("2024-03-05 17:00:00"));
        assert!(!report.has_blockers());
        assert!(report.categories.is_empty());
        assert_eq!(report.total_minutes, 0);
    }

    #[test]
    fn test_eod_report_warns_about_unresolved_blocker() {
        let mut doc = sample();
        doc.current_blocker = Some(active("server down", "2024-03-01 16:00:00"));

        let report = eod_report(&doc, ts("2024-03-01 17:00:00"));
        assert_eq!(
            report.unresolved.as_ref().map(|u| u.blocker.description.as_str()),
            Some("server down")
        );
        assert_eq!(report.total_minutes, 40);
    }
}
