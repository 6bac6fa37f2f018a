//! Statistics over a parsed request log.
//!
//! Everything is recomputed from scratch in one pass; nothing is persisted.
//! Rate and average figures cover the trailing 10-minute window ending at
//! `now` (inclusive lower bound). Rates divide by the fixed 10 minutes, not by
//! the span the log actually covers.

use std::borrow::Borrow;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::record::{LogRecord, TIMESTAMP_FORMAT};

/// Length of the trailing window in seconds.
pub const WINDOW_SECS: i64 = 600;

const WINDOW_MINUTES: f64 = (WINDOW_SECS / 60) as f64;

/// Aggregates shown by the log viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_requests: u64,
    pub total_post_requests: u64,
    pub requests_10min: u64,
    pub post_requests_10min: u64,
    /// Requests per minute over the window.
    pub avg_requests_10min: f64,
    /// POST requests per minute over the window.
    pub avg_post_requests_10min: f64,
    pub avg_post_size_10min: f64,
    pub avg_get_time_10min: f64,
    pub avg_post_time_10min: f64,
    pub avg_get_queries_10min: f64,
    pub avg_post_queries_10min: f64,
    /// Oldest record timestamp (`None` for an empty log).
    #[serde(serialize_with = "ser_timestamp")]
    pub earliest: Option<NaiveDateTime>,
    /// Newest record timestamp (`None` for an empty log).
    #[serde(serialize_with = "ser_timestamp")]
    pub latest: Option<NaiveDateTime>,
    pub time_range: TimeRange,
}

/// Span between the oldest and newest record, broken into clock units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Whole span in seconds.
    pub total_secs: u64,
    pub days: u64,
    /// Hours past the last whole day.
    pub hours: u64,
    /// Minutes past the last whole hour.
    pub minutes: u64,
    /// Seconds past the last whole minute.
    pub seconds: u64,
}

impl TimeRange {
    pub fn from_secs(total_secs: u64) -> Self {
        Self {
            total_secs,
            days: total_secs / 86_400,
            hours: (total_secs / 3_600) % 24,
            minutes: (total_secs / 60) % 60,
            seconds: total_secs % 60,
        }
    }

    /// Coarsest two units, e.g. `"2 days, 3 hours"` or `"0 minutes, 12 seconds"`.
    pub fn summary(&self) -> String {
        if self.days > 0 {
            format!("{} days, {} hours", self.days, self.hours)
        } else if self.hours > 0 {
            format!("{} hours, {} minutes", self.hours, self.minutes)
        } else {
            format!("{} minutes, {} seconds", self.minutes, self.seconds)
        }
    }
}

/// Running sum + count for one windowed bucket.
#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    n: u64,
}

impl Mean {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    /// Arithmetic mean; 0 for an empty bucket.
    fn value(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum / self.n as f64
        }
    }
}

/// Compute statistics over `records` as seen at wall-clock time `now`.
///
/// Accepts owned or borrowed records, so a `parse_all` stream can be fed in
/// directly.
pub fn aggregate<I>(records: I, now: NaiveDateTime) -> Statistics
where
    I: IntoIterator,
    I::Item: Borrow<LogRecord>,
{
    let window_start = now - Duration::seconds(WINDOW_SECS);

    let mut stats = Statistics::default();
    let mut post_size = Mean::default();
    let mut get_time = Mean::default();
    let mut post_time = Mean::default();
    let mut get_queries = Mean::default();
    let mut post_queries = Mean::default();

    for r in records {
        let r = r.borrow();
        stats.earliest = Some(stats.earliest.map_or(r.timestamp, |t| t.min(r.timestamp)));
        stats.latest = Some(stats.latest.map_or(r.timestamp, |t| t.max(r.timestamp)));

        stats.total_requests += 1;
        if r.is_post() {
            stats.total_post_requests += 1;
        }

        if r.timestamp < window_start {
            continue;
        }
        stats.requests_10min += 1;

        if r.is_post() {
            stats.post_requests_10min += 1;
            post_size.push(r.bytes as f64);
            post_time.push(r.elapsed_seconds);
            post_queries.push(r.query_count as f64);
        } else if r.is_get() {
            get_time.push(r.elapsed_seconds);
            get_queries.push(r.query_count as f64);
        }
    }

    stats.avg_requests_10min = stats.requests_10min as f64 / WINDOW_MINUTES;
    stats.avg_post_requests_10min = stats.post_requests_10min as f64 / WINDOW_MINUTES;
    stats.avg_post_size_10min = post_size.value();
    stats.avg_get_time_10min = get_time.value();
    stats.avg_post_time_10min = post_time.value();
    stats.avg_get_queries_10min = get_queries.value();
    stats.avg_post_queries_10min = post_queries.value();

    if let (Some(first), Some(last)) = (stats.earliest, stats.latest) {
        let span = (last - first).num_seconds().max(0) as u64;
        stats.time_range = TimeRange::from_secs(span);
    }

    stats
}

fn ser_timestamp<S>(ts: &Option<NaiveDateTime>, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match ts {
        Some(t) => s.serialize_str(&t.format(TIMESTAMP_FORMAT).to_string()),
        None => s.serialize_none(),
    }
}
