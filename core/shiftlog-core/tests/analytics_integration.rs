//! Integration tests for multi-day analytics over a directory of store files.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use shiftlog_core::analytics::{
    analytics_for, discover_store_files, multi_day_analytics, test_store_analytics,
    AnalyticsOptions, TEST_OPERATOR_TOKEN,
};
use shiftlog_core::storage::store_file_name;
use shiftlog_core::timestamp::parse_timestamp;
use shiftlog_core::{
    save_document, Category, CompletedBlocker, Document, SessionContext, StorageConfig,
};
use tempfile::tempdir;

fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn blocker(category: Category, start: &str, minutes: i64) -> CompletedBlocker {
    let start = ts(start);
    CompletedBlocker {
        description: format!("{category} issue"),
        category,
        start_time: start,
        end_time: start + Duration::minutes(minutes),
        duration_minutes: minutes,
        tickets: vec![],
        notes: vec![],
    }
}

fn write_store(dir: &Path, token: &str, date: &str, blockers: Vec<CompletedBlocker>) {
    let doc = Document {
        blockers,
        ..Default::default()
    };
    save_document(&dir.join(store_file_name(token, day(date))), &doc).unwrap();
}

#[test]
fn test_empty_window_reports_full_efficiency() {
    let temp = tempdir().unwrap();
    let analytics = multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());

    assert_eq!(analytics.days.len(), 8);
    assert_eq!(analytics.start_date, day("2024-03-01"));
    assert_eq!(analytics.end_date, day("2024-03-08"));
    for stats in &analytics.days {
        assert_eq!(stats.blocker_count, 0);
        assert_eq!(stats.efficiency, 100.0);
    }
    assert!(analytics.operators.is_empty());
    assert!(analytics.active_operators.is_empty());
    assert!(analytics.top_categories.is_empty());
    assert_eq!(analytics.avg_resolution_minutes, 0.0);
}

#[test]
fn test_daily_stats_across_operators() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    write_store(
        dir,
        "Jane_Bob",
        "2024-03-07",
        vec![
            blocker(Category::Hardware, "2024-03-07 09:00:00", 60),
            blocker(Category::Software, "2024-03-07 13:00:00", 30),
        ],
    );
    write_store(
        dir,
        "Carl",
        "2024-03-07",
        vec![blocker(Category::Hardware, "2024-03-07 10:00:00", 30)],
    );

    let analytics = multi_day_analytics(dir, day("2024-03-08"), &AnalyticsOptions::default());
    let mar7 = analytics
        .days
        .iter()
        .find(|d| d.date == day("2024-03-07"))
        .unwrap();

    assert_eq!(mar7.file_count, 2);
    assert_eq!(mar7.blocker_count, 3);
    assert_eq!(mar7.total_minutes, 120);
    assert_eq!(mar7.efficiency, 75.0);
    assert_eq!(mar7.operators, vec!["Bob", "Carl", "Jane"]);
    assert_eq!(analytics.total_blockers, 3);
    assert_eq!(analytics.total_downtime_minutes, 120);
    assert_eq!(analytics.avg_resolution_minutes, 40.0);
}

#[test]
fn test_blockers_from_other_days_are_ignored() {
    let temp = tempdir().unwrap();
    write_store(
        temp.path(),
        "Jane",
        "2024-03-07",
        vec![
            blocker(Category::Hardware, "2024-03-06 23:50:00", 40),
            blocker(Category::Other, "2024-03-07 08:00:00", 10),
        ],
    );

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    assert_eq!(analytics.total_blockers, 1);
    assert_eq!(analytics.total_downtime_minutes, 10);
}

#[test]
fn test_files_outside_window_are_ignored() {
    let temp = tempdir().unwrap();
    write_store(
        temp.path(),
        "Jane",
        "2024-02-20",
        vec![blocker(Category::Hardware, "2024-02-20 09:00:00", 60)],
    );

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    assert_eq!(analytics.total_blockers, 0);
    assert!(analytics.operators.is_empty());
}

#[test]
fn test_over_shift_day_has_zero_efficiency() {
    let temp = tempdir().unwrap();
    write_store(
        temp.path(),
        "Jane",
        "2024-03-08",
        vec![blocker(Category::Connectivity, "2024-03-08 06:00:00", 500)],
    );

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    assert_eq!(analytics.days.last().unwrap().efficiency, 0.0);
}

#[test]
fn test_category_stats_and_top_three() {
    let temp = tempdir().unwrap();
    write_store(
        temp.path(),
        "Jane",
        "2024-03-05",
        vec![
            blocker(Category::Hardware, "2024-03-05 09:00:00", 10),
            blocker(Category::Hardware, "2024-03-05 10:00:00", 15),
            blocker(Category::Software, "2024-03-05 11:00:00", 50),
            blocker(Category::Connectivity, "2024-03-05 12:00:00", 5),
            blocker(Category::Other, "2024-03-05 13:00:00", 7),
        ],
    );

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());

    let hardware = analytics
        .categories
        .iter()
        .find(|c| c.category == Category::Hardware)
        .unwrap();
    assert_eq!(hardware.count, 2);
    assert_eq!(hardware.total_minutes, 25);
    assert_eq!(hardware.avg_resolution_minutes, 12.5);

    let top: Vec<_> = analytics.top_categories.iter().map(|c| c.category).collect();
    assert_eq!(
        top,
        vec![Category::Software, Category::Hardware, Category::Other]
    );
}

#[test]
fn test_operator_series_and_overall_efficiency() {
    let temp = tempdir().unwrap();
    write_store(
        temp.path(),
        "Jane_Bob",
        "2024-03-06",
        vec![blocker(Category::Hardware, "2024-03-06 09:00:00", 240)],
    );
    write_store(temp.path(), "Jane", "2024-03-07", vec![]);

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());

    let jane = analytics
        .operators
        .iter()
        .find(|o| o.operator == "Jane")
        .unwrap();
    assert_eq!(jane.daily.len(), 2);
    assert_eq!(jane.blocker_count, 1);
    assert_eq!(jane.total_minutes, 240);
    assert_eq!(jane.overall_efficiency, 75.0);

    let bob = analytics
        .operators
        .iter()
        .find(|o| o.operator == "Bob")
        .unwrap();
    assert_eq!(bob.daily.len(), 1);
    assert_eq!(bob.overall_efficiency, 50.0);
}

#[test]
fn test_active_operators_come_from_most_recent_day() {
    let temp = tempdir().unwrap();
    write_store(temp.path(), "Jane", "2024-03-03", vec![]);
    write_store(temp.path(), "Bob", "2024-03-07", vec![]);
    write_store(temp.path(), "Carl_Dee", "2024-03-07", vec![]);

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    assert_eq!(analytics.active_operators, vec!["Bob", "Carl", "Dee"]);
}

#[test]
fn test_active_operators_fall_back_to_window() {
    let temp = tempdir().unwrap();
    write_store(temp.path(), "Jane", "2024-03-02", vec![]);
    write_store(temp.path(), "Bob", "2024-03-04", vec![]);

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    assert_eq!(analytics.active_operators, vec!["Bob", "Jane"]);
}

#[test]
fn test_discovery_skips_unrelated_files() {
    let temp = tempdir().unwrap();
    write_store(temp.path(), "Jane", "2024-03-07", vec![]);
    std::fs::write(temp.path().join("notes.txt"), "hello").unwrap();
    std::fs::create_dir(temp.path().join("Bob_eod_data_2024-03-07.json")).unwrap();

    let files = discover_store_files(temp.path());
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].operator_token, "Jane");
}

#[test]
fn test_corrupt_file_counts_as_no_blockers() {
    let temp = tempdir().unwrap();
    std::fs::write(
        temp.path().join("Jane_eod_data_2024-03-08.json"),
        "{ not json",
    )
    .unwrap();

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    let today = analytics.days.last().unwrap();
    assert_eq!(today.file_count, 1);
    assert_eq!(today.blocker_count, 0);
    assert_eq!(analytics.active_operators, vec!["Jane"]);
}

#[test]
fn test_custom_shift_length() {
    let temp = tempdir().unwrap();
    write_store(
        temp.path(),
        "Jane",
        "2024-03-08",
        vec![blocker(Category::Hardware, "2024-03-08 09:00:00", 60)],
    );
    let options = AnalyticsOptions {
        window_days: 1,
        shift_minutes: 600,
        active_lookback_days: 0,
    };

    let analytics = multi_day_analytics(temp.path(), day("2024-03-08"), &options);
    assert_eq!(analytics.days.len(), 2);
    assert_eq!(analytics.days[1].efficiency, 90.0);
}

#[test]
fn test_top_category_ties_sort_by_name() {
    let temp = tempdir().unwrap();
    write_store(
        temp.path(),
        "Jane",
        "2024-03-05",
        vec![
            blocker(Category::Software, "2024-03-05 09:00:00", 10),
            blocker(Category::Other, "2024-03-05 10:00:00", 10),
            blocker(Category::Hardware, "2024-03-05 11:00:00", 10),
            blocker(Category::Connectivity, "2024-03-05 12:00:00", 10),
        ],
    );

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    let top: Vec<_> = analytics.top_categories.iter().map(|c| c.category).collect();
    assert_eq!(
        top,
        vec![Category::Connectivity, Category::Hardware, Category::Other]
    );
}

#[test]
fn test_average_resolution_rounds_half_to_even() {
    let temp = tempdir().unwrap();
    // 9 minutes over 4 blockers is 2.25.
    write_store(
        temp.path(),
        "Jane",
        "2024-03-08",
        vec![
            blocker(Category::Hardware, "2024-03-08 09:00:00", 2),
            blocker(Category::Hardware, "2024-03-08 10:00:00", 2),
            blocker(Category::Hardware, "2024-03-08 11:00:00", 2),
            blocker(Category::Hardware, "2024-03-08 12:00:00", 3),
        ],
    );

    let analytics =
        multi_day_analytics(temp.path(), day("2024-03-08"), &AnalyticsOptions::default());
    assert_eq!(analytics.avg_resolution_minutes, 2.2);
    assert_eq!(analytics.categories[0].avg_resolution_minutes, 2.2);
}

#[test]
fn test_test_store_counts_on_days_with_activity() {
    let temp = tempdir().unwrap();
    let test_file = temp.path().join("test/test_data.json");
    let doc = Document {
        blockers: vec![
            blocker(Category::Hardware, "2024-03-06 09:00:00", 48),
            blocker(Category::Software, "2024-03-08 09:00:00", 96),
            blocker(Category::Other, "2024-02-01 09:00:00", 30),
        ],
        ..Default::default()
    };
    save_document(&test_file, &doc).unwrap();

    let analytics =
        test_store_analytics(&test_file, day("2024-03-08"), &AnalyticsOptions::default());
    assert_eq!(analytics.total_blockers, 2);
    assert_eq!(analytics.total_downtime_minutes, 144);

    let mar6 = analytics
        .days
        .iter()
        .find(|d| d.date == day("2024-03-06"))
        .unwrap();
    assert_eq!(mar6.file_count, 1);
    assert_eq!(mar6.efficiency, 90.0);
    let mar7 = analytics
        .days
        .iter()
        .find(|d| d.date == day("2024-03-07"))
        .unwrap();
    assert_eq!(mar7.file_count, 0);

    assert_eq!(analytics.active_operators, vec![TEST_OPERATOR_TOKEN]);
    assert_eq!(analytics.operators.len(), 1);
    assert_eq!(analytics.operators[0].daily.len(), 2);
}

#[test]
fn test_analytics_for_context_follows_test_mode() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    save_document(
        &storage.test_data_file(),
        &Document {
            blockers: vec![blocker(Category::Hardware, "2024-03-08 09:00:00", 60)],
            ..Default::default()
        },
    )
    .unwrap();
    write_store(
        &storage.production_dir(),
        "Jane",
        "2024-03-08",
        vec![blocker(Category::Hardware, "2024-03-08 10:00:00", 5)],
    );

    let options = AnalyticsOptions::default();
    let test = analytics_for(
        &SessionContext::new(storage.clone(), true),
        day("2024-03-08"),
        &options,
    );
    assert_eq!(test.total_downtime_minutes, 60);

    let production = analytics_for(
        &SessionContext::new(storage, false),
        day("2024-03-08"),
        &options,
    );
    assert_eq!(production.total_downtime_minutes, 5);
    assert_eq!(production.active_operators, vec!["Jane"]);
}
