//! Statistics aggregation over parsed records.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{Duration, NaiveDate, NaiveDateTime};

use reqlog_core::record::{encode, LogRecord};
use reqlog_core::stats::{aggregate, Statistics, TimeRange};
use reqlog_core::store::LogStore;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn rec(ago_secs: i64, method: &str, bytes: u64, time: f64, queries: u64) -> LogRecord {
    let mut r = LogRecord::new(
        now() - Duration::seconds(ago_secs),
        bytes,
        time,
        method,
        "/",
        "127.0.0.1",
        "ua",
    );
    r.query_count = queries;
    r
}

#[test]
fn empty_log_yields_all_zero_statistics() {
    let records: Vec<LogRecord> = Vec::new();
    let stats = aggregate(&records, now());

    assert_eq!(stats, Statistics::default());
    assert_eq!(stats.total_requests, 0);
    assert_eq!(stats.avg_requests_10min, 0.0);
    assert_eq!(stats.avg_get_time_10min, 0.0);
    assert!(stats.earliest.is_none() && stats.latest.is_none());
    assert_eq!(stats.time_range, TimeRange::default());
}

#[test]
fn only_records_inside_the_window_feed_averages() {
    let records = vec![
        rec(5 * 60, "GET", 0, 0.2, 4),
        rec(15 * 60, "GET", 0, 9.0, 90),
    ];
    let stats = aggregate(&records, now());

    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.requests_10min, 1);
    assert_eq!(stats.avg_get_time_10min, 0.2);
    assert_eq!(stats.avg_get_queries_10min, 4.0);
}

#[test]
fn window_lower_bound_is_inclusive() {
    let records = vec![rec(600, "GET", 0, 0.1, 1), rec(601, "GET", 0, 0.1, 1)];
    let stats = aggregate(&records, now());
    assert_eq!(stats.requests_10min, 1);
}

#[test]
fn request_rate_divides_by_ten_minutes() {
    // 30 GETs spread over the last 1..=9 minutes, even though the log spans only 8.
    let records: Vec<_> = (0..30)
        .map(|i| rec(60 + i * (8 * 60) / 29, "GET", 0, 0.01, 1))
        .collect();
    let stats = aggregate(&records, now());

    assert_eq!(stats.requests_10min, 30);
    assert_eq!(stats.avg_requests_10min, 3.0);
    assert_eq!(stats.avg_post_requests_10min, 0.0);
}

#[test]
fn post_bucket_tracks_size_time_and_queries() {
    let records = vec![
        rec(10, "POST", 100, 0.5, 10),
        rec(20, "POST", 300, 1.5, 20),
        rec(30, "GET", 999, 0.25, 2),
        rec(40, "PUT", 5000, 7.0, 70),
    ];
    let stats = aggregate(&records, now());

    assert_eq!(stats.total_requests, 4);
    assert_eq!(stats.total_post_requests, 2);
    assert_eq!(stats.requests_10min, 4);
    assert_eq!(stats.post_requests_10min, 2);
    assert_eq!(stats.avg_post_requests_10min, 0.2);
    assert_eq!(stats.avg_post_size_10min, 200.0);
    assert_eq!(stats.avg_post_time_10min, 1.0);
    assert_eq!(stats.avg_post_queries_10min, 15.0);
    assert_eq!(stats.avg_get_time_10min, 0.25);
    assert_eq!(stats.avg_get_queries_10min, 2.0);
}

#[test]
fn time_range_covers_oldest_to_newest_in_any_order() {
    let records = vec![
        rec(3_600, "GET", 0, 0.0, 0),
        rec(2 * 86_400 + 3 * 3_600 + 3_600 + 125, "GET", 0, 0.0, 0),
        rec(0, "GET", 0, 0.0, 0),
    ];
    let stats = aggregate(&records, now());

    assert_eq!(stats.latest, Some(now()));
    let range = stats.time_range;
    assert_eq!((range.days, range.hours, range.minutes, range.seconds), (2, 4, 2, 5));
    assert_eq!(range.summary(), "2 days, 4 hours");
}

#[test]
fn aggregate_consumes_a_parsed_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = LogStore::new(dir.path().join("request-logs.log"));
    store.append(&encode(&rec(30, "GET", 0, 0.1, 3))).unwrap();
    store.append("[garbage").unwrap();
    store.append(&encode(&rec(60, "POST", 64, 0.3, 5))).unwrap();

    let parsed = reqlog_core::record::parse_all(&store).unwrap();
    let stats = aggregate(parsed, now());

    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.avg_post_size_10min, 64.0);
    assert_eq!(stats.time_range.total_secs, 30);
}
