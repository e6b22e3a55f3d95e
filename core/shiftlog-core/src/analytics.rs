//! Multi-day, multi-operator analytics for the manager view.
//!
//! Scans every `{operators}_eod_data_{date}.json` file in a data directory
//! over a window ending today (today − 7 … today by default) and derives:
//!
//! - per-day blocker count, blocked minutes and efficiency
//! - per-category count, minutes and average resolution time
//! - per-operator daily series and overall efficiency
//! - the three categories with the most blocked minutes
//! - the operators on the most recent day that has any data
//!
//! Efficiency is `(shift − blocked) / shift × 100`, clamped to `[0, 100]`,
//! and 0 once blocked time exceeds the shift. A day without files counts as
//! a day without downtime (100).
//!
//! The test store is a single undated file; in test mode it stands in for a
//! store file of operator [`TEST_OPERATOR_TOKEN`] on every day it has activity.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::ShiftConfig;
use crate::patterns::RE_STORE_FILE;
use crate::session::{token_operators, SessionContext};
use crate::store::load_document;
use crate::timestamp::DATE_FORMAT;
use crate::types::{Category, SessionInfo};

const TOP_CATEGORY_COUNT: usize = 3;

/// Operator name analytics reports for the test store.
pub const TEST_OPERATOR_TOKEN: &str = "TEST";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsOptions {
    /// Days before today included in the window.
    pub window_days: u32,
    pub shift_minutes: u32,
    pub active_lookback_days: u32,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        AnalyticsOptions::from(&ShiftConfig::default())
    }
}

impl From<&ShiftConfig> for AnalyticsOptions {
    fn from(config: &ShiftConfig) -> Self {
        AnalyticsOptions {
            window_days: config.analytics_days,
            shift_minutes: config.shift_minutes,
            active_lookback_days: config.active_lookback_days,
        }
    }
}

/// A store file found on disk, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFile {
    pub path: PathBuf,
    pub operator_token: String,
    pub date: NaiveDate,
}

impl StoreFile {
    pub fn operators(&self) -> Vec<String> {
        token_operators(&self.operator_token)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub file_count: usize,
    pub blocker_count: usize,
    pub total_minutes: i64,
    pub efficiency: f64,
    pub operators: Vec<String>,
    pub session_info: Vec<SessionInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: Category,
    pub count: usize,
    pub total_minutes: i64,
    /// Minutes per blocker, one decimal.
    pub avg_resolution_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorDay {
    pub date: NaiveDate,
    pub blocker_count: usize,
    pub total_minutes: i64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorStats {
    pub operator: String,
    pub blocker_count: usize,
    pub total_minutes: i64,
    /// Only days on which this operator has a store file.
    pub daily: Vec<OperatorDay>,
    /// Mean of the daily efficiencies; 100 with no days.
    pub overall_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DayStats>,
    pub categories: Vec<CategoryStats>,
    pub operators: Vec<OperatorStats>,
    pub top_categories: Vec<CategoryStats>,
    pub total_blockers: usize,
    pub total_downtime_minutes: i64,
    pub avg_resolution_minutes: f64,
    pub active_operators: Vec<String>,
}

/// `(shift − blocked) / shift × 100`, clamped; 0 once blocked exceeds the shift.
pub fn efficiency(total_minutes: i64, shift_minutes: u32) -> f64 {
    let shift = i64::from(shift_minutes.max(1));
    if total_minutes > shift {
        return 0.0;
    }
    ((shift - total_minutes) as f64 / shift as f64 * 100.0).clamp(0.0, 100.0)
}

/// One decimal, halves to even (`2.25` → `2.2`).
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Splits `Jane_Bob_eod_data_2024-03-01.json` into its operator token and date.
pub fn parse_store_file_name(name: &str) -> Option<(String, NaiveDate)> {
    let caps = RE_STORE_FILE.captures(name)?;
    let date = NaiveDate::parse_from_str(&caps["date"], DATE_FORMAT).ok()?;
    Some((caps["operators"].to_string(), date))
}

/// Store files directly inside `dir`, sorted by file name. Unreadable or
/// missing directories yield nothing.
pub fn discover_store_files(dir: &Path) -> Vec<StoreFile> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_str()?;
            let (operator_token, date) = parse_store_file_name(name)?;
            Some(StoreFile {
                path: e.path().to_path_buf(),
                operator_token,
                date,
            })
        })
        .collect()
}

#[derive(Default)]
struct Tally {
    count: usize,
    minutes: i64,
}

impl Tally {
    fn add(&mut self, count: usize, minutes: i64) {
        self.count += count;
        self.minutes += minutes;
    }
}

/// Analytics over whichever store `ctx` writes to.
pub fn analytics_for(
    ctx: &SessionContext,
    today: NaiveDate,
    options: &AnalyticsOptions,
) -> Analytics {
    if ctx.test_mode {
        test_store_analytics(&ctx.storage.test_data_file(), today, options)
    } else {
        multi_day_analytics(&ctx.data_dir(), today, options)
    }
}

pub fn multi_day_analytics(
    data_dir: &Path,
    today: NaiveDate,
    options: &AnalyticsOptions,
) -> Analytics {
    let files = discover_store_files(data_dir);
    tracing::debug!(dir = %data_dir.display(), files = files.len(), "Scanning store files");
    analyze(&files, today, options)
}

/// Analytics for the single test store, dated by the days it has activity on.
pub fn test_store_analytics(
    test_file: &Path,
    today: NaiveDate,
    options: &AnalyticsOptions,
) -> Analytics {
    let doc = load_document(test_file);
    let mut dates: BTreeSet<NaiveDate> = doc.blockers.iter().map(|b| b.start_time.date()).collect();
    dates.extend(doc.current_blocker.iter().map(|b| b.start_time.date()));
    dates.extend(doc.session_info.iter().map(|info| info.date));

    let files: Vec<StoreFile> = dates
        .into_iter()
        .map(|date| StoreFile {
            path: test_file.to_path_buf(),
            operator_token: TEST_OPERATOR_TOKEN.to_string(),
            date,
        })
        .collect();
    analyze(&files, today, options)
}

fn analyze(files: &[StoreFile], today: NaiveDate, options: &AnalyticsOptions) -> Analytics {
    let start_date = today - Duration::days(i64::from(options.window_days));

    let mut files_by_date: BTreeMap<NaiveDate, Vec<&StoreFile>> = BTreeMap::new();
    for file in files {
        files_by_date.entry(file.date).or_default().push(file);
    }

    let mut days = Vec::new();
    let mut categories: BTreeMap<Category, Tally> = BTreeMap::new();
    let mut operator_days: BTreeMap<String, BTreeMap<NaiveDate, Tally>> = BTreeMap::new();
    let mut window_operators: BTreeSet<String> = BTreeSet::new();

    for date in start_date.iter_days().take_while(|d| *d <= today) {
        let day_files = files_by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
        let mut day = Tally::default();
        let mut day_operators = BTreeSet::new();
        let mut session_info = Vec::new();

        for file in day_files {
            let doc = load_document(&file.path);
            let mut file_tally = Tally::default();
            for blocker in doc.blockers_on(date) {
                file_tally.add(1, blocker.duration_minutes);
                categories
                    .entry(blocker.category)
                    .or_default()
                    .add(1, blocker.duration_minutes);
            }

            for operator in file.operators() {
                operator_days
                    .entry(operator.clone())
                    .or_default()
                    .entry(date)
                    .or_default()
                    .add(file_tally.count, file_tally.minutes);
                day_operators.insert(operator);
            }

            day.add(file_tally.count, file_tally.minutes);
            session_info.extend(doc.session_info);
        }

        window_operators.extend(day_operators.iter().cloned());
        days.push(DayStats {
            date,
            file_count: day_files.len(),
            blocker_count: day.count,
            total_minutes: day.minutes,
            efficiency: efficiency(day.minutes, options.shift_minutes),
            operators: day_operators.into_iter().collect(),
            session_info,
        });
    }

    let categories: Vec<CategoryStats> = categories
        .into_iter()
        .map(|(category, t)| CategoryStats {
            category,
            count: t.count,
            total_minutes: t.minutes,
            avg_resolution_minutes: if t.count > 0 {
                round1(t.minutes as f64 / t.count as f64)
            } else {
                0.0
            },
        })
        .collect();

    let mut top_categories = categories.clone();
    top_categories.sort_by(|a, b| {
        b.total_minutes
            .cmp(&a.total_minutes)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    top_categories.truncate(TOP_CATEGORY_COUNT);

    let operators = operator_days
        .into_iter()
        .map(|(operator, by_date)| operator_stats(operator, by_date, options.shift_minutes))
        .collect();

    let total_blockers: usize = days.iter().map(|d| d.blocker_count).sum();
    let total_downtime_minutes: i64 = days.iter().map(|d| d.total_minutes).sum();
    let avg_resolution_minutes = if total_blockers > 0 {
        round1(total_downtime_minutes as f64 / total_blockers as f64)
    } else {
        0.0
    };

    let active_operators = active_operators(
        &files_by_date,
        today,
        options.active_lookback_days,
        &window_operators,
    );

    Analytics {
        start_date,
        end_date: today,
        days,
        categories,
        operators,
        top_categories,
        total_blockers,
        total_downtime_minutes,
        avg_resolution_minutes,
        active_operators,
    }
}

fn operator_stats(
    operator: String,
    by_date: BTreeMap<NaiveDate, Tally>,
    shift_minutes: u32,
) -> OperatorStats {
    let daily: Vec<OperatorDay> = by_date
        .into_iter()
        .map(|(date, t)| OperatorDay {
            date,
            blocker_count: t.count,
            total_minutes: t.minutes,
            efficiency: efficiency(t.minutes, shift_minutes),
        })
        .collect();

    let overall_efficiency = if daily.is_empty() {
        100.0
    } else {
        daily.iter().map(|d| d.efficiency).sum::<f64>() / daily.len() as f64
    };

    OperatorStats {
        operator,
        blocker_count: daily.iter().map(|d| d.blocker_count).sum(),
        total_minutes: daily.iter().map(|d| d.total_minutes).sum(),
        daily,
        overall_efficiency,
    }
}

/// Operators of the most recent day (today, then up to `lookback` earlier
/// days) that has any store file; otherwise everyone seen in the window.
fn active_operators(
    files_by_date: &BTreeMap<NaiveDate, Vec<&StoreFile>>,
    today: NaiveDate,
    lookback: u32,
    window_operators: &BTreeSet<String>,
) -> Vec<String> {
    for offset in 0..=i64::from(lookback) {
        let date = today - Duration::days(offset);
        if let Some(day_files) = files_by_date.get(&date).filter(|f| !f.is_empty()) {
            let operators: BTreeSet<String> =
                day_files.iter().flat_map(|f| f.operators()).collect();
            return operators.into_iter().collect();
        }
    }
    window_operators.iter().cloned().collect()
}
